//! NSL-KDD Dataset Server
//!
//! HTTP front-end for [`kdd_processing`]: accepts an ARFF upload, splits it
//! into stratified train / validation / test sets and returns sizes, label
//! distributions and one histogram per split.
//!
//! # Routes
//!
//! - `POST /process/` - multipart upload (`file`, optional `label_column` and `seed`)
//! - `GET /health/` - liveness probe
//!
//! Both routes also answer without the trailing slash.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ApiError;
pub use state::AppState;

use kdd_processing::config::{DEFAULT_LABEL_COLUMN, DEFAULT_SEED};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Largest accepted upload, in bytes (10 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Origins allowed by CORS when `DEBUG` is off.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Server configuration, read from CLI flags or the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_UPLOAD_SIZE", default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    pub max_upload_size: usize,

    /// Comma-separated list of allowed CORS origins
    #[arg(
        long,
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_CORS_ORIGINS
    )]
    pub cors_allowed_origins: Vec<String>,

    /// Development mode: allow any CORS origin
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Include the error source chain as `traceback` in error responses
    #[arg(
        long,
        env = "EXPOSE_TRACEBACK",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub expose_traceback: bool,

    /// Default label (stratification) column
    #[arg(long, env = "LABEL_COLUMN", default_value = DEFAULT_LABEL_COLUMN)]
    pub label_column: String,

    /// Default split seed
    #[arg(long, env = "SPLIT_SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS
                .split(',')
                .map(str::to_string)
                .collect(),
            debug: false,
            expose_traceback: true,
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            seed: DEFAULT_SEED,
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(config.clone())?);
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        max_upload_size_mb = config.max_upload_size / 1024 / 1024,
        debug = config.debug,
        started_at = %start_time.to_rfc3339(),
        "NSL-KDD server starting"
    );
    if config.debug {
        warn!("DEBUG is on: CORS allows any origin");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert!(config.expose_traceback);
        assert!(!config.debug);
    }
}
