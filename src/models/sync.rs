//! Import batch payloads from the bridge service and the sync watermark.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DocType, LegalUnit, Licensing, PiiStatus};
use crate::errors::AppError;

/// Request body for `POST /sync/import`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportBatch {
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
    #[serde(default)]
    pub qa_entries: Vec<QaInput>,
    /// Opaque batch marker echoed back to the bridge
    pub batch_ts: String,
}

/// One document in an import batch.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub id: Uuid,
    pub title: String,
    pub doc_type: DocType,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub amended_date: Option<NaiveDate>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub file_s3: Option<String>,
    /// `None` leaves stored units alone; `Some` (even empty) replaces them
    #[serde(default)]
    pub legal_units: Option<Vec<LegalUnit>>,
}

/// One question/answer pair in an import batch.
#[derive(Debug, Clone, Deserialize)]
pub struct QaInput {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub topic_tags: BTreeSet<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub answered_at: Option<NaiveDate>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub licensing: Licensing,
    #[serde(default)]
    pub pii_status: PiiStatus,
    #[serde(default = "default_moderation_status")]
    pub moderation_status: String,
}

fn default_moderation_status() -> String {
    "published".to_string()
}

impl ImportBatch {
    /// Semantic checks that typed deserialization cannot express.
    ///
    /// Runs before the reconciler opens a transaction; any failure rejects the whole batch.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.batch_ts.trim().is_empty() {
            return Err(AppError::Validation("batch_ts is required".to_string()));
        }

        for (i, doc) in self.documents.iter().enumerate() {
            if doc.title.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "documents[{}] ({}): title is required",
                    i, doc.id
                )));
            }
        }

        for (i, qa) in self.qa_entries.iter().enumerate() {
            if qa.question.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "qa_entries[{}] ({}): question is required",
                    i, qa.id
                )));
            }
            if qa.answer.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "qa_entries[{}] ({}): answer is required",
                    i, qa.id
                )));
            }
            if qa.quality_score.is_some_and(|s| !s.is_finite()) {
                return Err(AppError::Validation(format!(
                    "qa_entries[{}] ({}): quality_score must be a finite number",
                    i, qa.id
                )));
            }
        }

        Ok(())
    }
}

/// Per-kind counts of accepted items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedCounts {
    pub documents: usize,
    pub qa_entries: usize,
}

/// Response body for a committed import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportResult {
    pub status: String,
    pub imported: ImportedCounts,
    pub batch_ts: String,
}

impl ImportResult {
    pub fn success(imported: ImportedCounts, batch_ts: String) -> Self {
        Self {
            status: "success".to_string(),
            imported,
            batch_ts,
        }
    }
}

/// Time of the most recent committed import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncWatermark {
    pub last_imported_at: String,
}
