//! Advisor Core Backend
//!
//! Stores legal documents and Q&A entries imported from the bridge service, with SQLite
//! persistence and a filesystem object store for raw source files.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use storage::{FilesystemStore, ObjectStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub storage: Arc<dyn ObjectStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting {} ({})", config.project_name, config.env);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!(
        "Object store: {:?} (bucket {})",
        config.storage_path,
        config.storage_bucket
    );
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.bridge_token.is_none() {
        tracing::warn!("No bridge token configured (ADVISOR_BRIDGE_TOKEN). Sync routes are disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize object store
    let storage: Arc<dyn ObjectStore> =
        Arc::new(FilesystemStore::open(&config.storage_path, &config.storage_bucket).await?);

    let state = AppState {
        repo,
        storage,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // Clone token for the auth layer
    let token = state.config.bridge_token.clone();

    // Bridge routes
    let sync_routes = Router::new()
        .route("/import", post(api::import_batch))
        .route("/watermark", get(api::get_watermark))
        .route("/files/{*key}", put(api::upload_file))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(middleware::from_fn(move |req, next| {
            auth::bridge_token_layer(token.clone(), req, next)
        }));

    // Public read-only routes
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route("/stats", get(api::get_stats))
        .route("/documents/{id}", get(api::get_document))
        .route("/qa-entries/{id}", get(api::get_qa_entry))
        .route("/files/{*key}", get(api::download_file))
        .nest("/sync", sync_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS restricted to the configured origin list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(auth::BRIDGE_TOKEN_HEADER),
        ])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests;
