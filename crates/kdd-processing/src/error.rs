//! Custom error types for the dataset processing pipeline.
//!
//! This module provides the error hierarchy shared by the loader, the splitter
//! and the renderer, built with `thiserror`.
//!
//! Errors are serializable so the HTTP layer and the CLI can report them as
//! `{ "code": ..., "message": ... }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the processing pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Every loading strategy failed; `attempts` holds one reason per strategy, in order.
    #[error("Failed to load ARFF dataset: {}", format_attempts(.attempts))]
    DatasetLoad { attempts: Vec<String> },

    /// The label (stratification) column could not be found or inferred.
    #[error("Label column '{hint}' not found in dataset (available columns: {})", .available.join(", "))]
    LabelColumnNotFound { hint: String, available: Vec<String> },

    /// Some class has too few rows to appear on both sides of a stratified split.
    #[error(
        "The least populated class '{label}' in column '{column}' has only {count} member(s); \
         at least 2 are required to stratify"
    )]
    InsufficientClassMembers {
        column: String,
        label: String,
        count: usize,
    },

    /// One side of a split would be smaller than the number of classes.
    #[error(
        "Cannot stratify {rows} rows with {classes} classes into {train} and {test} rows: \
         each side needs at least one row per class"
    )]
    SplitTooSmall {
        rows: usize,
        classes: usize,
        train: usize,
        test: usize,
    },

    /// The dataset holds no rows to split.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The label column contains missing values, which cannot be stratified.
    #[error("Label column '{column}' has {count} missing value(s)")]
    MissingLabels { column: String, count: usize },

    /// Histogram rendering failed.
    #[error("Failed to render histogram: {0}")]
    Render(String),

    /// An allocation could not be satisfied while building the table.
    #[error("Out of memory while processing dataset: {0}")]
    ResourceExhausted(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

fn format_attempts(attempts: &[String]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(i, reason)| format!("[{}] {}", i + 1, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatasetLoad { .. } => "DATASET_LOAD_FAILED",
            Self::LabelColumnNotFound { .. } => "LABEL_COLUMN_NOT_FOUND",
            Self::InsufficientClassMembers { .. } => "INSUFFICIENT_CLASS_MEMBERS",
            Self::SplitTooSmall { .. } => "SPLIT_TOO_SMALL",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::MissingLabels { .. } => "MISSING_LABELS",
            Self::Render(_) => "RENDER_FAILED",
            Self::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Strip any context wrappers and return the innermost error.
    pub fn root(&self) -> &ProcessingError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error was caused by the uploaded data rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.root(),
            Self::DatasetLoad { .. }
                | Self::LabelColumnNotFound { .. }
                | Self::InsufficientClassMembers { .. }
                | Self::SplitTooSmall { .. }
                | Self::EmptyDataset
                | Self::MissingLabels { .. }
                | Self::InvalidConfig(_)
        )
    }

    /// Whether the error is an out-of-memory condition.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self.root(), Self::ResourceExhausted(_))
    }
}

impl From<std::collections::TryReserveError> for ProcessingError {
    fn from(err: std::collections::TryReserveError) -> Self {
        ProcessingError::ResourceExhausted(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}
