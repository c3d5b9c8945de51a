//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// Service name
    #[schema(example = "vistazo-server")]
    pub service: &'static str,
    /// Whether an index snapshot is loaded
    pub index_loaded: bool,
    /// Number of catalog images in the index
    #[schema(example = 1200)]
    pub index_entries: usize,
    /// Whether external vector search is configured
    pub vector_search: bool,
}

/// GET /health - Health check endpoint
///
/// Always 200; `status` is "degraded" while no index is loaded.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let index_loaded = state.engine.is_some();

    Json(HealthResponse {
        status: if index_loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "vistazo-server",
        index_loaded,
        index_entries: state.index_entries(),
        vector_search: state.vector.is_some(),
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Kubernetes readiness probe
///
/// 200 once an index is loaded, 503 otherwise.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve searches", body = ReadyResponse),
        (status = 503, description = "No index loaded", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.engine.is_some() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some("Search index not loaded; rebuild the index"),
            }),
        )
    }
}
