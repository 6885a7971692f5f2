//! Configuration module for the advisor core service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default cap on request bodies accepted by the sync routes (50 MiB).
const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported by the root endpoint
    pub project_name: String,
    /// Deployment environment label (dev, staging, prod)
    pub env: String,
    /// Shared secret the bridge must present on sync routes
    pub bridge_token: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root directory of the object store
    pub storage_path: PathBuf,
    /// Bucket name under the object store root
    pub storage_bucket: String,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Request body limit for the sync routes
    pub max_body_bytes: usize,
}

/// Invalid value in an environment variable.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let project_name =
            env::var("ADVISOR_PROJECT_NAME").unwrap_or_else(|_| "advisor-core".to_string());

        let env_name = env::var("ADVISOR_ENV").unwrap_or_else(|_| "dev".to_string());

        let bridge_token = env::var("ADVISOR_BRIDGE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let db_path = env::var("ADVISOR_DB_PATH")
            .unwrap_or_else(|_| "./data/advisor.sqlite".to_string())
            .into();

        let storage_path = env::var("ADVISOR_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/objects".to_string())
            .into();

        let storage_bucket =
            env::var("ADVISOR_STORAGE_BUCKET").unwrap_or_else(|_| "advisor-docs".to_string());

        let allowed_origins = parse_origins(
            &env::var("ADVISOR_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let bind_addr = env::var("ADVISOR_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|e| ConfigError {
                var: "ADVISOR_BIND_ADDR",
                message: format!("{}", e),
            })?;

        let log_level = env::var("ADVISOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("ADVISOR_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let max_body_bytes = match env::var("ADVISOR_MAX_BODY_BYTES") {
            Ok(raw) => raw.trim().parse().map_err(|e| ConfigError {
                var: "ADVISOR_MAX_BODY_BYTES",
                message: format!("{}", e),
            })?,
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            project_name,
            env: env_name,
            bridge_token,
            db_path,
            storage_path,
            storage_bucket,
            allowed_origins,
            bind_addr,
            log_level,
            log_format,
            max_body_bytes,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
