//! Sync API endpoints used by the bridge service. All routes here sit behind the token layer.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;

use super::{json_rejection, success, ApiResult};
use crate::models::{ImportBatch, ImportResult, SyncWatermark};
use crate::storage::validate_key;
use crate::AppState;

/// POST /sync/import - Upsert a batch of documents and Q&A entries.
///
/// The whole body is parsed and validated before the repository opens its transaction,
/// so a malformed item rejects the batch without touching storage.
pub async fn import_batch(
    State(state): State<AppState>,
    payload: Result<Json<ImportBatch>, JsonRejection>,
) -> ApiResult<ImportResult> {
    let Json(batch) = payload.map_err(json_rejection)?;
    batch.validate()?;

    tracing::debug!(
        batch_ts = %batch.batch_ts,
        documents = batch.documents.len(),
        qa_entries = batch.qa_entries.len(),
        "Received sync batch"
    );

    let result = state.repo.import_batch(&batch).await?;
    success(result)
}

/// GET /sync/watermark - Time of the last committed import, `null` before the first.
pub async fn get_watermark(State(state): State<AppState>) -> ApiResult<Option<SyncWatermark>> {
    let watermark = state.repo.get_watermark().await?;
    success(watermark)
}

/// Stored object reference returned after an upload.
#[derive(Debug, Serialize)]
pub struct StoredObject {
    pub key: String,
    /// Value to put in a document's `file_s3` field
    pub file_s3: String,
    pub size: usize,
}

/// PUT /sync/files/{*key} - Store a raw source file.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> ApiResult<StoredObject> {
    validate_key(&key)?;
    state.storage.put(&key, &body).await?;

    tracing::info!(key = %key, size = body.len(), "Stored raw file");

    success(StoredObject {
        file_s3: state.storage.locator(&key),
        size: body.len(),
        key,
    })
}
