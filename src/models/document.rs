//! Legal document and legal unit models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of legal text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Law,
    Regulation,
    Circular,
    Guideline,
}

impl DocType {
    pub const ALL: [DocType; 4] = [
        DocType::Law,
        DocType::Regulation,
        DocType::Circular,
        DocType::Guideline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Law => "law",
            DocType::Regulation => "regulation",
            DocType::Circular => "circular",
            DocType::Guideline => "guideline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Editorial lifecycle of a document. Imported documents are always published.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    Draft,
    InReview,
    Approved,
    #[default]
    Published,
}

impl DocStatus {
    pub const ALL: [DocStatus; 4] = [
        DocStatus::Draft,
        DocStatus::InReview,
        DocStatus::Approved,
        DocStatus::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocStatus::Draft => "draft",
            DocStatus::InReview => "in_review",
            DocStatus::Approved => "approved",
            DocStatus::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// Structural level of a fragment within a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Part,
    Chapter,
    Section,
    Article,
    Paragraph,
    Clause,
    Item,
    Note,
    Annex,
}

impl UnitType {
    pub const ALL: [UnitType; 9] = [
        UnitType::Part,
        UnitType::Chapter,
        UnitType::Section,
        UnitType::Article,
        UnitType::Paragraph,
        UnitType::Clause,
        UnitType::Item,
        UnitType::Note,
        UnitType::Annex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Part => "part",
            UnitType::Chapter => "chapter",
            UnitType::Section => "section",
            UnitType::Article => "article",
            UnitType::Paragraph => "paragraph",
            UnitType::Clause => "clause",
            UnitType::Item => "item",
            UnitType::Note => "note",
            UnitType::Annex => "annex",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// A structural fragment of a document (article, clause, ...).
///
/// Used both on the wire and as the stored shape; the storage row id is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalUnit {
    pub unit_type: UnitType,
    #[serde(default)]
    pub num_label: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub text_plain: Option<String>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// A stored legal document with its units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub doc_type: DocType,
    pub jurisdiction: Option<String>,
    pub authority: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub amended_date: Option<NaiveDate>,
    pub source_url: Option<String>,
    /// Object store locator of the raw source file
    pub file_s3: Option<String>,
    pub status: DocStatus,
    pub created_at: String,
    pub updated_at: String,
    pub legal_units: Vec<LegalUnit>,
}
