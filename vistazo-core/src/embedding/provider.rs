//! Vector search providers and their configuration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::http_client::{VectorHttpClient, VectorHttpConfig};
use super::{FeatureVector, MockVectorSearch, Neighbor, VectorSearch, VectorSource};
use crate::error::{Result, VistazoError};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for an HTTP vector search service.
#[derive(Clone)]
pub struct VectorSearchConfig {
    /// Full URL of the neighbor query endpoint.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl std::fmt::Debug for VectorSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorSearchConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl VectorSearchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `VECTOR_SEARCH_URL`
    /// Optional: `VECTOR_SEARCH_API_KEY`, `VECTOR_SEARCH_TIMEOUT_SECS` (10),
    /// `VECTOR_SEARCH_MAX_RETRIES` (3)
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("VECTOR_SEARCH_URL").map_err(|_| {
            VistazoError::InvalidConfig("VECTOR_SEARCH_URL environment variable not set".into())
        })?;

        let timeout_secs = parse_env("VECTOR_SEARCH_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_retries = parse_env("VECTOR_SEARCH_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;

        Ok(Self {
            endpoint,
            api_key: std::env::var("VECTOR_SEARCH_API_KEY").ok(),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| VistazoError::InvalidConfig(format!("{key} has invalid value {raw:?}"))),
        Err(_) => Ok(default),
    }
}

/// Which provider to construct.
#[derive(Debug, Clone)]
pub enum VectorProviderConfig {
    Http(VectorSearchConfig),
    /// Serves a fixed neighbor list.
    Mock(Vec<Neighbor>),
}

impl VectorProviderConfig {
    pub fn from_env() -> Result<Self> {
        VectorSearchConfig::from_env().map(Self::Http)
    }
}

pub struct VectorSearchFactory;

impl VectorSearchFactory {
    pub fn create(config: VectorProviderConfig) -> Result<Arc<dyn VectorSearch>> {
        match config {
            VectorProviderConfig::Http(http) => Ok(Arc::new(HttpVectorSearch::new(http)?)),
            VectorProviderConfig::Mock(neighbors) => Ok(Arc::new(MockVectorSearch::new(neighbors))),
        }
    }
}

#[derive(Debug, Serialize)]
struct NeighborsRequest<'a> {
    feature_vector: &'a [f32],
    neighbor_count: usize,
}

/// Hits may arrive under `neighbors` or `results`; a body with neither is
/// rejected rather than read as an empty answer.
#[derive(Debug, Deserialize)]
struct NeighborsResponse {
    #[serde(alias = "results")]
    neighbors: Vec<Neighbor>,
}

/// Vector search over a JSON HTTP endpoint.
///
/// Request: `{"feature_vector": [...], "neighbor_count": n}`.
/// Response: `{"neighbors": [{"id", "distance" | "score", "metadata"}]}`,
/// with `results` accepted in place of `neighbors`.
pub struct HttpVectorSearch {
    http: VectorHttpClient,
    config: VectorSearchConfig,
}

impl HttpVectorSearch {
    #[instrument(level = "debug", skip_all, fields(endpoint = %config.endpoint))]
    pub fn new(config: VectorSearchConfig) -> Result<Self> {
        debug!("Creating vector search client");

        let http = VectorHttpClient::new(VectorHttpConfig {
            timeout: config.timeout,
            max_retries: config.max_retries,
            bearer_token: config.api_key.clone(),
            ..VectorHttpConfig::default()
        })?;

        info!("Vector search client created");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &VectorSearchConfig {
        &self.config
    }
}

#[async_trait]
impl VectorSearch for HttpVectorSearch {
    #[instrument(
        level = "info",
        skip(self, vector),
        fields(dimensions = vector.len(), max_retries = self.config.max_retries)
    )]
    async fn find_neighbors(
        &self,
        vector: &FeatureVector,
        neighbor_count: usize,
    ) -> Result<Vec<Neighbor>> {
        let start = Instant::now();
        let request = NeighborsRequest {
            feature_vector: vector.as_slice(),
            neighbor_count,
        };

        let response: NeighborsResponse = self.http.post_json(&self.config.endpoint, &request).await?;
        let mut neighbors = response.neighbors;
        neighbors.truncate(neighbor_count);

        info!(
            neighbors = neighbors.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Vector search completed"
        );
        Ok(neighbors)
    }

    fn source(&self) -> VectorSource {
        VectorSource::Http {
            endpoint: self.config.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = VectorSearchConfig {
            api_key: Some("super-secret".into()),
            ..VectorSearchConfig::new("https://vectors.example/query")
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("vectors.example"));
    }

    #[test]
    fn test_factory_creates_http_provider() {
        let provider = VectorSearchFactory::create(VectorProviderConfig::Http(
            VectorSearchConfig::new("http://localhost:9000/neighbors"),
        ))
        .unwrap();
        assert_eq!(
            provider.source(),
            VectorSource::Http {
                endpoint: "http://localhost:9000/neighbors".into()
            }
        );
    }

    #[test]
    fn test_factory_creates_mock_provider() {
        let provider = VectorSearchFactory::create(VectorProviderConfig::Mock(vec![])).unwrap();
        assert_eq!(provider.source(), VectorSource::Mock);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(NeighborsRequest {
            feature_vector: &[0.5, 0.25],
            neighbor_count: 3,
        })
        .unwrap();
        assert_eq!(body["neighbor_count"], 3);
        assert_eq!(body["feature_vector"][1], 0.25);
    }

    #[test]
    fn test_response_accepts_neighbors_and_results_keys() {
        let neighbors: NeighborsResponse = serde_json::from_str(
            r#"{"neighbors": [{"id": "dp-1", "distance": 0.1}]}"#,
        )
        .unwrap();
        assert_eq!(neighbors.neighbors.len(), 1);

        let results: NeighborsResponse = serde_json::from_str(
            r#"{"results": [{"id": "dp-1", "distance": 0.1}, {"id": "dp-2", "score": 0.4}]}"#,
        )
        .unwrap();
        assert_eq!(results.neighbors.len(), 2);
        assert_eq!(results.neighbors[1].score, Some(0.4));
    }

    #[test]
    fn test_response_without_hits_key_is_rejected() {
        assert!(serde_json::from_str::<NeighborsResponse>(r#"{"matches": []}"#).is_err());
        assert!(serde_json::from_str::<NeighborsResponse>("{}").is_err());
    }

    #[test]
    fn test_response_tolerates_duplicate_metadata_spellings() {
        let response: NeighborsResponse = serde_json::from_str(
            r#"{"results": [{"id": "dp-1", "distance": 0.2,
                "metadata": {"filename": "a.jpg", "file": "a.jpg", "gcs_uri": "gs://b/a.jpg", "uri": "gs://b/a.jpg"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.neighbors[0].metadata.filename.as_deref(), Some("a.jpg"));
    }
}
