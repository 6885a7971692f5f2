//! REST API module.
//!
//! Public read-only routes plus the token-gated `/sync` routes used by the bridge.

mod files;
mod health;
mod records;
mod stats;
mod sync;

pub use files::*;
pub use health::*;
pub use records::*;
pub use stats::*;
pub use sync::*;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::Json;

use crate::errors::AppError;

/// Response type that can be either a JSON body or an error envelope.
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Create a successful API response.
pub fn success<T>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

/// Turn a body extraction failure into a validation error in the common envelope.
pub fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}

/// Turn a path parameter failure (e.g. a non-UUID id) into a validation error.
pub fn path_rejection(rejection: PathRejection) -> AppError {
    AppError::Validation(rejection.body_text())
}
