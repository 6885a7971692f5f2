//! Question/answer entry model.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an answer may be reused downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Licensing {
    #[default]
    Allowed,
    Restricted,
}

impl Licensing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Licensing::Allowed => "allowed",
            Licensing::Restricted => "restricted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "allowed" => Some(Licensing::Allowed),
            "restricted" => Some(Licensing::Restricted),
            _ => None,
        }
    }
}

/// Whether the text contains personally identifiable information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PiiStatus {
    #[default]
    Clean,
    Contains,
}

impl PiiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiStatus::Clean => "clean",
            PiiStatus::Contains => "contains",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "clean" => Some(PiiStatus::Clean),
            "contains" => Some(PiiStatus::Contains),
            _ => None,
        }
    }
}

/// A stored question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaEntry {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    /// Sorted and de-duplicated
    pub topic_tags: BTreeSet<String>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub org: Option<String>,
    pub answered_at: Option<NaiveDate>,
    pub quality_score: Option<f64>,
    pub licensing: Licensing,
    pub pii_status: PiiStatus,
    pub moderation_status: String,
    pub created_at: String,
    pub updated_at: String,
}
