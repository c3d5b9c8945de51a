//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod search;
pub mod vector;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use search::{
    search_handler, search_json_handler, QuerySignature, SearchHit, SearchJsonRequest,
    SearchResponse,
};
pub use vector::{vector_search_handler, VectorResults, VectorSearchRequest, VectorSearchResponse};
