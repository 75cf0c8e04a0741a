//! The analysis pipeline driver: multipart upload → temp store → prompt →
//! external analysis call → normalization.
//!
//! The stored upload is deleted on every exit path — the `StoredUpload`
//! guard removes the file when it goes out of scope, whichever branch
//! returns. The upstream call is never retried; the only resilience is the
//! normalizer's repair chain.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::analysis::prompt::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::analysis::{normalize, CanonicalReport};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub report: CanonicalReport,
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut note: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart body: {e}");
                return Err(ApiError::BadRequest(format!("Malformed request body: {e}")));
            }
        };
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("report.pdf").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!("Failed to read upload bytes: {e}");
                    ApiError::BadRequest("Failed to read file data".into())
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            "note" => {
                note = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(ApiError::NoFileProvided)?;

    let stored = ctx.store.store(&bytes, &filename)?;
    tracing::info!(
        original = %stored.original_name(),
        size = bytes.len(),
        "Starting report analysis"
    );

    let prompt = build_analysis_prompt(note.as_deref());
    let client = ctx.client.clone();
    let document = stored.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        client.analyze(&document, &prompt, ANALYSIS_SYSTEM_PROMPT)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))??;

    let report = normalize(output)?;

    tracing::info!(
        findings = report.abnormal_findings.len(),
        categories = report.categorized_analysis.len(),
        "Report analysis complete"
    );

    stored.release();
    Ok(Json(AnalyzeResponse { report }))
}
