//! Error types for the server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kdd_processing::ProcessingError;
use serde_json::json;
use std::error::Error as _;
use thiserror::Error;

const OUT_OF_MEMORY_MESSAGE: &str =
    "The dataset is too large to process with the available memory. Upload a smaller file.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file was uploaded (expected a multipart field named 'file')")]
    MissingFile,

    #[error("The file is too large. Maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("The file is not valid UTF-8 text: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile
            | Self::InvalidEncoding(_)
            | Self::InvalidField { .. }
            | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Processing(e) if e.is_resource_exhausted() => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Processing(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Processing(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFile => "MISSING_FILE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InvalidEncoding(_) => "INVALID_ENCODING",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::Multipart(_) => "MULTIPART_ERROR",
            Self::Processing(e) => e.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the client.
    pub fn message(&self) -> String {
        match self {
            Self::Processing(e) if e.is_resource_exhausted() => OUT_OF_MEMORY_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// The error followed by each of its sources.
    pub fn traceback(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }

    /// Build the JSON error response, optionally including the source chain.
    pub fn into_response_with(self, expose_traceback: bool) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), detail = %self, "Request failed");
        } else {
            tracing::warn!(code = self.error_code(), detail = %self, "Request rejected");
        }

        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });
        if expose_traceback {
            body["traceback"] = json!(self.traceback());
        }

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::FileTooLarge { max_mb: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(ProcessingError::EmptyDataset).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProcessingError::ResourceExhausted("alloc".to_string())).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(ProcessingError::Render("png".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_resource_exhausted_has_distinct_message() {
        let error = ApiError::from(ProcessingError::ResourceExhausted("alloc".to_string()));
        assert_eq!(error.message(), OUT_OF_MEMORY_MESSAGE);
        assert_eq!(error.error_code(), "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn test_traceback_follows_sources() {
        let error = ApiError::from(ProcessingError::EmptyDataset.with_context("Splitting"));
        let chain = error.traceback();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], "Splitting: Dataset is empty");
        assert_eq!(chain[1], "Dataset is empty");
    }
}
