//! Statistics endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::Stats;
use crate::AppState;

/// GET /stats - Document totals by status and type, plus the Q&A total.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Stats> {
    let stats = state.repo.stats().await?;
    success(stats)
}
