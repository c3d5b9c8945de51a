//! Vector search handler
//!
//! Handles POST /vector-search: nearest neighbors for an externally computed
//! image embedding, degrading to the local index when the service fails.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use vistazo_core::embedding::{
    search_or_degrade, EmbeddingPayload, FeatureVector, RankedNeighbor, ResultSource,
    VectorOutcome, VectorQuery,
};
use vistazo_core::{imaging, Index, ScoringConfig, SearchEngine, SignatureExtractor};

use crate::error::ApiError;
use crate::handlers::search::SearchHit;
use crate::state::AppState;
use crate::validation::{validate_file_size, validate_image_format};

/// Request for a vector similarity query.
#[derive(Deserialize, ToSchema)]
pub struct VectorSearchRequest {
    /// The embedding: a bare array, `{"embedding": [...]}`,
    /// `{"imageEmbedding": [...]}` or `{"predictions": [{"imageEmbedding": [...]}]}`.
    #[schema(value_type = Vec<f32>)]
    pub feature_vector: serde_json::Value,

    /// Neighbors to request (default 10, clamped to the server maximum).
    #[serde(default)]
    #[schema(example = 10)]
    pub neighbor_count: Option<usize>,

    /// L2-normalize the embedding before querying.
    #[serde(default)]
    pub normalize: bool,

    /// Query color; neighbors tagged with another color rank lower.
    #[serde(default)]
    #[schema(example = "red")]
    pub color: Option<String>,

    /// Query image as a data URI; enables the local fallback.
    #[serde(default)]
    pub image: Option<String>,
}

/// Results from either pipeline.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VectorResults {
    Vector(Vec<RankedNeighbor>),
    Local(Vec<SearchHit>),
}

/// Response for a vector similarity query.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchResponse {
    /// Unique id for log correlation.
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: String,

    /// `vector` or `local`.
    #[schema(value_type = String, example = "vector")]
    pub source: ResultSource,

    #[schema(value_type = Vec<Object>)]
    pub results: VectorResults,

    pub results_before_filter: usize,

    pub results_after_filter: usize,

    /// Why the local fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    /// RFC 3339 response time.
    #[schema(example = "2026-01-07T10:00:00Z")]
    pub timestamp: String,
}

/// Find nearest neighbors for an image embedding
///
/// The embedding must have the configured dimension (1408 by default).
/// When the vector service is unavailable or times out and an `image` is
/// supplied, the image is searched against the local index instead.
#[utoipa::path(
    post,
    path = "/vector-search",
    tag = "Vector Search",
    request_body = VectorSearchRequest,
    responses(
        (status = 200, description = "Ranked neighbors", body = VectorSearchResponse),
        (status = 400, description = "Invalid embedding shape or dimension"),
        (status = 408, description = "Vector search timed out and no fallback image was given"),
        (status = 503, description = "Vector search unavailable and no fallback image was given")
    )
)]
pub async fn vector_search_handler(
    State(state): State<AppState>,
    Json(request): Json<VectorSearchRequest>,
) -> Result<Json<VectorSearchResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let started = Instant::now();

    let payload = EmbeddingPayload::from_value(request.feature_vector)?;
    let mut vector = FeatureVector::from_payload(payload, state.neighbors.expected_dimensions)?;
    if request.normalize {
        vector = vector.l2_normalize();
    }

    let image = match request.image.as_deref() {
        Some(uri) => {
            let bytes = imaging::decode_data_uri(uri)?;
            validate_file_size(bytes.len(), state.max_file_size)?;
            validate_image_format(&bytes)?;
            Some(bytes)
        }
        None => None,
    };

    // Without a local index there is nothing to degrade to.
    let (engine, image) = match &state.engine {
        Some(engine) => (Arc::clone(engine), image),
        None => (Arc::new(empty_engine()), None),
    };

    let query = VectorQuery {
        vector,
        neighbor_count: state.neighbors.neighbor_count(request.neighbor_count),
        color: request.color,
        image,
        min_similarity: state.neighbors.min_similarity,
        timeout: state.vector_timeout,
    };

    let outcome = search_or_degrade(state.vector.as_deref(), &engine, query).await?;
    let source = outcome.source();

    let (results, before, after, fallback_reason) = match outcome {
        VectorOutcome::Vector(ranking) => (
            VectorResults::Vector(ranking.results),
            ranking.results_before_filter,
            ranking.results_after_filter,
            None,
        ),
        VectorOutcome::Local { results, reason } => {
            let hits: Vec<SearchHit> = results
                .matches
                .into_iter()
                .map(|m| SearchHit {
                    product_name: state.product_name(m.product_id.as_deref()),
                    filename: m.filename,
                    product_id: m.product_id,
                    distance: m.distance,
                })
                .collect();
            let count = hits.len();
            (VectorResults::Local(hits), results.accepted, count, Some(reason))
        }
    };

    info!(
        request_id = %request_id,
        source = ?source,
        results = after,
        latency_ms = started.elapsed().as_millis() as u64,
        "Vector search request served"
    );

    Ok(Json(VectorSearchResponse {
        request_id,
        source,
        results,
        results_before_filter: before,
        results_after_filter: after,
        fallback_reason,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

fn empty_engine() -> SearchEngine {
    SearchEngine::new(
        Arc::new(Index::default()),
        ScoringConfig::default(),
        SignatureExtractor::default(),
    )
}
