//! Similarity search handlers
//!
//! Handles POST /search (multipart upload) and POST /search/json (data URI).

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;
use vistazo_core::{imaging, ScoringPreset, SearchOptions, SearchResults};

use crate::error::ApiError;
use crate::multipart::MultipartFields;
use crate::state::AppState;
use crate::validation::{parse_optional, validate_file_size, validate_image_format};

/// JSON search request.
#[derive(Deserialize, ToSchema)]
pub struct SearchJsonRequest {
    /// Query image as a `data:image/...;base64,` URI or bare base64.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQSkZJRg...")]
    pub image: String,

    /// Maximum combined score to accept; overrides the preset.
    #[serde(default)]
    #[schema(example = 24)]
    pub threshold: Option<u32>,

    /// Maximum number of products to return (default: 10, max: 50).
    #[serde(default)]
    #[schema(example = 10)]
    pub limit: Option<usize>,

    /// Scoring preset: `strict`, `permissive` or `vertex-fallback`.
    #[serde(default)]
    #[schema(example = "strict")]
    pub preset: Option<String>,
}

/// A single product match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Catalog image path relative to the index root.
    #[schema(example = "red hoodie/front.jpg")]
    pub filename: String,

    /// Product id, when the image was matched to the catalog.
    #[schema(example = "p-1001")]
    pub product_id: Option<String>,

    /// Combined score (0 = identical).
    #[schema(example = 3)]
    pub distance: u32,

    /// Product name from the catalog, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Red Hoodie")]
    pub product_name: Option<String>,
}

/// Signature computed for the query image.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuerySignature {
    #[schema(example = "c3a1e0f0f0e1a3c3")]
    pub phash: String,
    #[schema(example = "ffff818181ffff00")]
    pub ahash: Option<String>,
    #[schema(example = "c81e28")]
    pub color: Option<String>,
}

/// Response for a similarity search.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// Number of products returned.
    #[schema(example = 1)]
    pub count: usize,

    /// Preset the query was scored with.
    #[schema(example = "strict")]
    pub preset: String,

    /// Effective acceptance threshold.
    #[schema(example = 24)]
    pub threshold: u32,

    /// Best match per product, closest first.
    pub results: Vec<SearchHit>,

    pub query: QuerySignature,
}

/// Request parameters shared by both search endpoints.
struct QueryParams {
    threshold: Option<u32>,
    limit: Option<usize>,
    preset: Option<ScoringPreset>,
}

impl QueryParams {
    fn options(&self, default_limit: usize) -> SearchOptions {
        SearchOptions {
            threshold: self.threshold,
            limit: self.limit.unwrap_or(default_limit),
            preset: self.preset,
        }
    }
}

/// Search the catalog with an uploaded image
///
/// Accepts multipart/form-data with:
/// - **file** (required): The query image
/// - **threshold** (optional): Maximum combined score
/// - **limit** (optional): Maximum products returned (default 10, max 50)
/// - **preset** (optional): `strict`, `permissive` or `vertex-fallback`
#[utoipa::path(
    post,
    path = "/search",
    tag = "Search",
    request_body(
        content_type = "multipart/form-data",
        description = "Query image and optional scoring parameters"
    ),
    responses(
        (status = 200, description = "Ranked matches", body = SearchResponse),
        (status = 400, description = "Invalid request (missing or undecodable image, bad parameter)"),
        (status = 503, description = "Search index not available")
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let file = fields.take_file()?;
    debug!(
        file_name = ?file.file_name,
        content_type = ?file.content_type,
        bytes = file.data.len(),
        "Received query image"
    );
    let params = QueryParams {
        threshold: fields.get_parsed("threshold")?,
        limit: fields.get_parsed("limit")?,
        preset: parse_preset(fields.get_text("preset"))?,
    };

    run_search(&state, file.data, params).await.map(Json)
}

/// Search the catalog with a base64-encoded image
#[utoipa::path(
    post,
    path = "/search/json",
    tag = "Search",
    request_body = SearchJsonRequest,
    responses(
        (status = 200, description = "Ranked matches", body = SearchResponse),
        (status = 400, description = "Invalid request (bad data URI, undecodable image, bad parameter)"),
        (status = 503, description = "Search index not available")
    )
)]
pub async fn search_json_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchJsonRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let bytes = imaging::decode_data_uri(&request.image)?;
    validate_file_size(bytes.len(), state.max_file_size)?;
    let params = QueryParams {
        threshold: request.threshold,
        limit: request.limit,
        preset: parse_preset(request.preset.as_deref())?,
    };

    run_search(&state, bytes, params).await.map(Json)
}

fn parse_preset(value: Option<&str>) -> Result<Option<ScoringPreset>, ApiError> {
    parse_optional("preset", value)
}

async fn run_search(
    state: &AppState,
    bytes: Vec<u8>,
    params: QueryParams,
) -> Result<SearchResponse, ApiError> {
    let engine = state.require_engine()?;
    validate_image_format(&bytes)?;

    let started = Instant::now();
    let options = params.options(state.default_limit);
    let results = tokio::task::spawn_blocking(move || engine.search_bytes(&bytes, &options))
        .await
        .map_err(|e| ApiError::internal(format!("Search task failed: {}", e)))??;

    info!(
        preset = %results.preset,
        evaluated = results.evaluated,
        returned = results.matches.len(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Search request served"
    );

    Ok(build_response(state, results))
}

fn build_response(state: &AppState, results: SearchResults) -> SearchResponse {
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

    SearchResponse {
        count: hits.len(),
        preset: results.preset.to_string(),
        threshold: results.threshold,
        results: hits,
        query: QuerySignature {
            phash: results.query.phash.to_hex(),
            ahash: results.query.ahash.map(|h| h.to_hex()),
            color: results.query.color.map(|c| c.to_hex()),
        },
    }
}
