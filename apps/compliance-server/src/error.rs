//! Error types for the compliance server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared_types::DocumentId;
use thiserror::Error;

use crate::store::StoreError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Empty file")]
    EmptyUpload,

    #[error("File not found: {0}")]
    FileNotFound(DocumentId),

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(DocumentId),

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::EmptyUpload => (
                StatusCode::BAD_REQUEST,
                "EMPTY_FILE",
                "Empty file".to_string(),
            ),
            ServerError::FileNotFound(_) => (
                StatusCode::NOT_FOUND,
                "FILE_NOT_FOUND",
                "File not found".to_string(),
            ),
            ServerError::AnalysisNotFound(_) => (
                StatusCode::NOT_FOUND,
                "ANALYSIS_NOT_FOUND",
                "Analysis not found".to_string(),
            ),
            ServerError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound(id) => ServerError::FileNotFound(id),
            StoreError::AnalysisNotFound(id) => ServerError::AnalysisNotFound(id),
        }
    }
}
