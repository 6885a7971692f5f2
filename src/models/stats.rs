//! Read-only statistics over stored records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub documents: DocumentStats,
    pub qa_entries: QaStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    pub total: i64,
    /// Counts keyed by status; statuses with no documents are omitted
    pub by_status: BTreeMap<String, i64>,
    /// Counts keyed by document type; types with no documents are omitted
    pub by_type: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaStats {
    pub total: i64,
}
