//! Bridge token authentication for the sync routes.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header carrying the bridge's shared secret.
pub const BRIDGE_TOKEN_HEADER: &str = "x-bridge-token";

/// Bridge token layer function that takes the expected token as a parameter.
///
/// Rejects before the request body is read, so no handler or storage code runs
/// for an unauthenticated caller.
pub async fn bridge_token_layer(
    expected_token: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    match check_token(expected_token.as_deref(), &request) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                path = %request.uri().path(),
                code = err.error_code(),
                "Rejected sync request"
            );
            err.into_response()
        }
    }
}

fn check_token(expected: Option<&str>, request: &Request) -> Result<(), AppError> {
    // Without a configured secret the sync routes stay closed
    let Some(expected) = expected else {
        return Err(AppError::SyncDisabled(
            "Sync import is disabled: no bridge token configured".to_string(),
        ));
    };

    let provided = request
        .headers()
        .get(BRIDGE_TOKEN_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing bridge token".to_string()))?;

    // Non-UTF-8 header bytes can never match a configured token
    let provided = provided.to_str().unwrap_or_default();

    if constant_time_compare(provided, expected) {
        Ok(())
    } else {
        Err(AppError::InvalidToken("Invalid bridge token".to_string()))
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
