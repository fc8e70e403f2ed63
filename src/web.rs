use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::hub::WeatherHub;

/// Build the full application router
pub fn app(hub: Arc<WeatherHub>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(AppState::new(hub)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(hub: Arc<WeatherHub>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);

    axum::serve(listener, app(hub))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server stopped unexpectedly")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
