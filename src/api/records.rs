//! Read endpoints for stored documents and Q&A entries.

use axum::extract::{rejection::PathRejection, Path, State};
use uuid::Uuid;

use super::{path_rejection, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Document, QaEntry};
use crate::AppState;

/// GET /documents/{id} - Get a document with its legal units.
pub async fn get_document(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Document> {
    let Path(id) = id.map_err(path_rejection)?;

    match state.repo.get_document(id).await? {
        Some(document) => success(document),
        None => Err(AppError::NotFound(format!("Document {} not found", id))),
    }
}

/// GET /qa-entries/{id} - Get a single Q&A entry.
pub async fn get_qa_entry(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<QaEntry> {
    let Path(id) = id.map_err(path_rejection)?;

    match state.repo.get_qa_entry(id).await? {
        Some(entry) => success(entry),
        None => Err(AppError::NotFound(format!("Q&A entry {} not found", id))),
    }
}
