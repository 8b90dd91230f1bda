//! Request handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{Multipart, State, multipart::{Field, MultipartRejection}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kdd_processing::{DatasetProcessor, ProcessingConfig, ProcessingReport};
use serde_json::json;
use tracing::info;

use super::error::{ApiError, Result};
use super::state::AppState;

const FILE_FIELD: &str = "file";
const LABEL_FIELD: &str = "label_column";
const SEED_FIELD: &str = "seed";

// ============================================================================
// Upload
// ============================================================================

/// Fields collected from the multipart body.
#[derive(Debug, Default)]
struct UploadRequest {
    file_name: Option<String>,
    content: Option<Vec<u8>>,
    label_column: Option<String>,
    seed: Option<u64>,
}

/// Split an uploaded ARFF dataset and return the report.
pub async fn process_dataset(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let expose_traceback = state.config.expose_traceback;
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            return ApiError::Multipart(rejection.body_text()).into_response_with(expose_traceback);
        }
    };
    match run_processing(&state, multipart).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => e.into_response_with(expose_traceback),
    }
}

async fn run_processing(state: &AppState, multipart: Multipart) -> Result<ProcessingReport> {
    let started = Instant::now();
    let upload = read_upload(multipart, state.config.max_upload_size).await?;
    let content = upload.content.ok_or(ApiError::MissingFile)?;

    info!(
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        size_kb = content.len() / 1024,
        "Received dataset upload"
    );

    let raw = String::from_utf8(content)?;
    let config = request_config(&state.processing, upload.label_column, upload.seed);
    let processor = DatasetProcessor::new(config)?;

    let report = tokio::task::spawn_blocking(move || processor.process(raw))
        .await
        .map_err(|e| ApiError::Internal(format!("processing task failed: {e}")))??;

    info!(
        total_instances = report.total_instances,
        strategy = %report.load_strategy,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Dataset processed"
    );
    Ok(report)
}

/// Apply per-request overrides to the server defaults.
fn request_config(
    defaults: &ProcessingConfig,
    label_column: Option<String>,
    seed: Option<u64>,
) -> ProcessingConfig {
    let mut config = defaults.clone();
    if let Some(label_column) = label_column {
        config.label_column = label_column;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config
}

async fn read_upload(mut multipart: Multipart, max_size: usize) -> Result<UploadRequest> {
    let mut upload = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error(max_size))? {
        match field.name().unwrap_or_default() {
            FILE_FIELD => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content = Some(read_limited(field, max_size).await?);
            }
            LABEL_FIELD => {
                let value = field.text().await.map_err(multipart_error(max_size))?;
                let value = value.trim();
                if value.is_empty() {
                    return Err(ApiError::InvalidField {
                        field: LABEL_FIELD.to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
                upload.label_column = Some(value.to_string());
            }
            SEED_FIELD => {
                let value = field.text().await.map_err(multipart_error(max_size))?;
                let seed = value.trim().parse::<u64>().map_err(|e| ApiError::InvalidField {
                    field: SEED_FIELD.to_string(),
                    reason: e.to_string(),
                })?;
                upload.seed = Some(seed);
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Read a file field chunk by chunk, failing as soon as it exceeds `max_size`.
async fn read_limited(mut field: Field<'_>, max_size: usize) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error(max_size))? {
        if content.len() + chunk.len() > max_size {
            return Err(too_large(max_size));
        }
        content.extend_from_slice(&chunk);
    }
    Ok(content)
}

fn too_large(max_size: usize) -> ApiError {
    ApiError::FileTooLarge {
        max_mb: max_size / 1024 / 1024,
    }
}

/// Body-limit rejections surface as multipart errors with status 413.
fn multipart_error(
    max_size: usize,
) -> impl Fn(axum::extract::multipart::MultipartError) -> ApiError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large(max_size)
        } else {
            ApiError::Multipart(e.body_text())
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Liveness probe.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
    }))
}
