//! Service info and health endpoints.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: &'static str,
    pub environment: String,
}

/// GET / - Service name, version and environment.
pub async fn root(State(state): State<AppState>) -> ApiResult<ServiceInfo> {
    success(ServiceInfo {
        message: format!("Welcome to {}", state.config.project_name),
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.env.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// "ok" when every dependency answered, "degraded" otherwise
    pub status: &'static str,
    pub env: String,
    pub db: bool,
    pub object_storage: bool,
}

/// GET /health - Probe the database and the object store.
///
/// Always answers 200; a failing dependency only flips its flag and the overall status.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    let db = match state.repo.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            false
        }
    };

    let object_storage = match state.storage.check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Object storage health check failed: {}", e);
            false
        }
    };

    success(HealthStatus {
        status: if db && object_storage { "ok" } else { "degraded" },
        env: state.config.env.clone(),
        db,
        object_storage,
    })
}
