//! In-memory vector search for tests and local development.

use std::time::Duration;

use async_trait::async_trait;

use super::{FeatureVector, Neighbor, VectorSearch, VectorSource};
use crate::error::{Result, VistazoError};

#[derive(Debug, Clone)]
enum Behavior {
    Respond,
    Fail(String),
    Delay(Duration),
}

/// Returns a fixed neighbor list, or fails/stalls on demand.
#[derive(Debug, Clone)]
pub struct MockVectorSearch {
    neighbors: Vec<Neighbor>,
    behavior: Behavior,
}

impl MockVectorSearch {
    pub fn new(neighbors: Vec<Neighbor>) -> Self {
        Self {
            neighbors,
            behavior: Behavior::Respond,
        }
    }

    /// Every query fails with a [`VistazoError::VectorSearchError`].
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            neighbors: Vec::new(),
            behavior: Behavior::Fail(reason.into()),
        }
    }

    /// Every query sleeps for `delay` before answering.
    pub fn delayed(neighbors: Vec<Neighbor>, delay: Duration) -> Self {
        Self {
            neighbors,
            behavior: Behavior::Delay(delay),
        }
    }
}

impl Default for MockVectorSearch {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl VectorSearch for MockVectorSearch {
    async fn find_neighbors(
        &self,
        _vector: &FeatureVector,
        neighbor_count: usize,
    ) -> Result<Vec<Neighbor>> {
        match &self.behavior {
            Behavior::Respond => {}
            Behavior::Fail(reason) => return Err(VistazoError::VectorSearchError(reason.clone())),
            Behavior::Delay(delay) => tokio::time::sleep(*delay).await,
        }
        Ok(self.neighbors.iter().take(neighbor_count).cloned().collect())
    }

    fn source(&self) -> VectorSource {
        VectorSource::Mock
    }
}
