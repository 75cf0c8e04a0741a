//! API error types with HTTP status mapping.
//!
//! Response body is a flat `{ "error": "<message>" }`. Upstream failures
//! pass the upstream message through; unparseable model output gets a
//! descriptive message while the raw text stays in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::render::PdfError;
use crate::storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFileProvided,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NoFileProvided => (StatusCode::BAD_REQUEST, "No file uploaded".to_string()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            ApiError::Storage(StorageError::NotAPdf) => (
                StatusCode::BAD_REQUEST,
                "Uploaded file is not a PDF".to_string(),
            ),
            ApiError::Storage(err @ StorageError::Write(_)) => {
                tracing::error!(error = %err, "Upload storage failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store uploaded file".to_string(),
                )
            }
            ApiError::Analysis(AnalysisError::Upstream(detail)) => {
                (StatusCode::BAD_GATEWAY, detail.clone())
            }
            ApiError::Analysis(AnalysisError::InvalidModelOutput { raw }) => {
                tracing::warn!(
                    raw = %raw.chars().take(512).collect::<String>(),
                    "Model output failed normalization"
                );
                (
                    StatusCode::BAD_GATEWAY,
                    "The analysis service returned an unreadable response. Please try again."
                        .to_string(),
                )
            }
            ApiError::Analysis(AnalysisError::Io(err)) => {
                tracing::error!(error = %err, "I/O failure during analysis");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Pdf(err) => {
                tracing::error!(error = %err, "PDF export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate PDF".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
