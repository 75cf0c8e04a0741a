//! API router.
//!
//! Three routes under `/api/`: health probe, the analysis upload endpoint,
//! and the PDF export endpoint. CORS is permissive unless an origin is
//! configured; the multipart body limit comes from configuration.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::api::types::ApiContext;
use crate::api::{analyze, export};
use crate::config;

/// Build the API router with all routes and layers.
pub fn api_router(ctx: ApiContext) -> Router {
    let cors = cors_layer(ctx.config.allowed_origin.as_deref());
    let body_limit = ctx.config.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze::analyze))
        .route("/api/report/pdf", post(export::export))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!(origin, "Invalid ALLOWED_ORIGIN, falling back to permissive CORS");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
    })
}
