//! Vistazo Server - REST API for visual similarity search
//!
//! Loads the index snapshot (and optionally a catalog and vector search
//! provider) once at startup, then serves:
//! - POST /search         - Multipart image search
//! - POST /search/json    - Data URI image search
//! - POST /vector-search  - Embedding search with local fallback
//! - GET  /health, /ready - Monitoring
//! - GET  /docs           - Swagger UI

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;
use vistazo_server::{create_router_with_config, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!(
        index = %config.index_path.display(),
        preset = %config.scoring_preset,
        strategy = config.color_strategy.name(),
        "Starting vistazo-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let state = AppState::from_config(&config)?;
    tracing::info!(entries = state.index_entries(), "Index ready");

    let app = create_router_with_config(&config, state);
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    // Connection info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
