//! Raw file download endpoint.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::AppState;

/// GET /files/{*key} - Return the bytes stored under a key.
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let data = state.storage.get(&key).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}
