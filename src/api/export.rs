//! Server-side PDF export of a canonical report.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::analysis::CanonicalReport;
use crate::api::error::ApiError;
use crate::render::{export_pdf, render, EXPORT_FILENAME};

pub async fn export(Json(report): Json<CanonicalReport>) -> Result<Response, ApiError> {
    let rendered = render(&report);
    let bytes = export_pdf(&rendered)?;

    tracing::debug!(size = bytes.len(), "Report exported to PDF");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
