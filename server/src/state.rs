//! Application state shared across handlers

use chrono::{DateTime, Utc};
use kdd_processing::{ProcessingConfig, ProcessingResult};

use super::ServerConfig;

/// Read-only state shared by all requests.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Defaults for every request; multipart fields may override label and seed.
    pub processing: ProcessingConfig,
    pub started_at: DateTime<Utc>,
}

static_assertions::assert_impl_all!(AppState: Send, Sync);

impl AppState {
    pub fn new(config: ServerConfig) -> ProcessingResult<Self> {
        let processing = ProcessingConfig::builder()
            .label_column(&config.label_column)
            .seed(config.seed)
            .build()?;

        Ok(Self {
            config,
            processing,
            started_at: Utc::now(),
        })
    }
}
