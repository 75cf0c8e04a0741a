//! HTTP server lifecycle — bind, serve, graceful shutdown.
//!
//! Pattern: bind a listener, build the router, run `axum::serve` until
//! ctrl-c. The orphan sweep runs once before the server accepts traffic so
//! uploads stranded by a crash never outlive the next start.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::analysis::{AnalysisClient, GeminiClient};
use crate::api::{api_router, ApiContext};
use crate::config::Config;

/// Run the analysis server until shutdown. Blocks the calling task.
pub async fn run(config: Config) -> Result<(), String> {
    let client = GeminiClient::new(
        &config.upstream_base_url,
        &config.api_key,
        &config.model,
        config.upstream_timeout_secs,
        config.structured_output,
    )
    .map_err(|e| format!("Failed to create analysis client: {e}"))?;

    serve(config, Arc::new(client)).await
}

/// Run with an injected analysis client. Factored out of `run` so tests
/// can drive a real listener with a mock upstream.
pub async fn serve(config: Config, client: Arc<dyn AnalysisClient>) -> Result<(), String> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    let bound = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {e}"))?;

    let ctx = ApiContext::new(Arc::new(config), client);
    ctx.store.sweep();

    let app = api_router(ctx);

    tracing::info!(%bound, "Analysis server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))?;

    tracing::info!("Analysis server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
