//! External embedding and vector-search path.
//!
//! Some deployments front the local hash index with an ML embedding model and
//! a hosted nearest-neighbor index. This module only consumes those services:
//!
//! - **payload**: the strict set of JSON shapes an embedding may arrive in,
//!   and dimension-checked [`FeatureVector`]s
//! - **neighbors**: similarity scoring, color bias and ranking of raw hits
//! - **provider** (feature `network`): HTTP-backed [`VectorSearch`] with retry
//! - **mock** (feature `network`): deterministic in-memory provider
//! - **fallback** (feature `network`): bounded-time query that degrades to the
//!   local perceptual pipeline
//!
//! ```no_run
//! # #[cfg(feature = "network")]
//! # async fn example() -> vistazo_core::Result<()> {
//! use vistazo_core::embedding::{
//!     FeatureVector, VectorProviderConfig, VectorSearchFactory, DEFAULT_DIMENSIONS,
//! };
//!
//! let provider = VectorSearchFactory::create(VectorProviderConfig::from_env()?)?;
//! let vector = FeatureVector::new(vec![0.0; DEFAULT_DIMENSIONS], DEFAULT_DIMENSIONS)?;
//! let neighbors = provider.find_neighbors(&vector, 10).await?;
//! println!("{} neighbors from {}", neighbors.len(), provider.source());
//! # Ok(())
//! # }
//! ```

mod neighbors;
mod payload;

#[cfg(feature = "network")]
mod fallback;
#[cfg(feature = "network")]
mod http_client;
#[cfg(feature = "network")]
mod mock;
#[cfg(feature = "network")]
mod provider;

pub use neighbors::{
    gs_to_https, rank_neighbors, similarity_from_distance, Neighbor, NeighborMetadata,
    NeighborQueryConfig, NeighborRanking, RankedNeighbor, COLOR_MISMATCH_FACTOR,
    DEFAULT_MAX_NEIGHBORS, DEFAULT_NEIGHBOR_COUNT,
};
pub use payload::{EmbeddingPayload, FeatureVector, Prediction, DEFAULT_DIMENSIONS};

#[cfg(feature = "network")]
pub use fallback::{search_or_degrade, ResultSource, VectorOutcome, VectorQuery};
#[cfg(feature = "network")]
pub use http_client::{is_transient_error, is_transient_status, VectorHttpClient, VectorHttpConfig};
#[cfg(feature = "network")]
pub use mock::MockVectorSearch;
#[cfg(feature = "network")]
pub use provider::{HttpVectorSearch, VectorProviderConfig, VectorSearchConfig, VectorSearchFactory};

#[cfg(feature = "network")]
use async_trait::async_trait;

#[cfg(feature = "network")]
use crate::error::Result;

/// A nearest-neighbor service over image embeddings.
///
/// Implementations must be thread-safe (`Send + Sync`) and handle transient
/// failures internally.
#[cfg(feature = "network")]
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Up to `neighbor_count` nearest datapoints, closest first.
    async fn find_neighbors(
        &self,
        vector: &FeatureVector,
        neighbor_count: usize,
    ) -> Result<Vec<Neighbor>>;

    fn source(&self) -> VectorSource;
}

/// Identifies which backend answered a vector query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VectorSource {
    /// Remote HTTP service.
    Http { endpoint: String },
    /// In-memory mock for tests.
    Mock,
}

impl std::fmt::Display for VectorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { endpoint } => write!(f, "HTTP ({endpoint})"),
            Self::Mock => write!(f, "Mock"),
        }
    }
}
