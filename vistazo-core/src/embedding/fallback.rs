//! Bounded-time vector queries with a local fallback.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use super::{rank_neighbors, FeatureVector, NeighborRanking, VectorSearch};
use crate::error::{Result, VistazoError};
use crate::scoring::ScoringPreset;
use crate::search::{SearchEngine, SearchOptions, SearchResults};

/// Which pipeline produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Vector,
    Local,
}

/// A single vector query and what to do if it cannot be answered.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: FeatureVector,
    pub neighbor_count: usize,
    /// Query color for the similarity bias.
    pub color: Option<String>,
    /// Encoded query image; enables the local fallback.
    pub image: Option<Vec<u8>>,
    pub min_similarity: f64,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum VectorOutcome {
    Vector(NeighborRanking),
    Local {
        results: SearchResults,
        /// Why the vector path was not used.
        reason: String,
    },
}

impl VectorOutcome {
    pub fn source(&self) -> ResultSource {
        match self {
            Self::Vector(_) => ResultSource::Vector,
            Self::Local { .. } => ResultSource::Local,
        }
    }
}

/// Query `provider` within `query.timeout`.
///
/// When the provider is absent, fails or times out and the query carries an
/// image, the image is searched locally with the `vertex-fallback` preset.
/// Without an image the provider error is returned.
pub async fn search_or_degrade(
    provider: Option<&dyn VectorSearch>,
    engine: &SearchEngine,
    query: VectorQuery,
) -> Result<VectorOutcome> {
    let start = Instant::now();

    let error = match provider {
        Some(provider) => {
            let lookup = provider.find_neighbors(&query.vector, query.neighbor_count);
            match tokio::time::timeout(query.timeout, lookup).await {
                Ok(Ok(neighbors)) => {
                    let ranking =
                        rank_neighbors(neighbors, query.color.as_deref(), query.min_similarity);
                    info!(
                        source = %provider.source(),
                        results = ranking.results_after_filter,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Vector search answered"
                    );
                    return Ok(VectorOutcome::Vector(ranking));
                }
                Ok(Err(e)) => e,
                Err(_) => VistazoError::Timeout(query.timeout.as_millis() as u64),
            }
        }
        None => VistazoError::VectorSearchError("vector search is not configured".into()),
    };

    let Some(image) = query.image else {
        return Err(error);
    };

    warn!(error = %error, "Vector search unavailable, degrading to local search");
    let reason = error.to_string();
    let engine = engine.clone();
    let options = SearchOptions {
        threshold: None,
        limit: query.neighbor_count,
        preset: Some(ScoringPreset::VertexFallback),
    };

    let results = tokio::task::spawn_blocking(move || engine.search_bytes(&image, &options))
        .await
        .map_err(|e| VistazoError::VectorSearchError(format!("local fallback task failed: {e}")))??;

    Ok(VectorOutcome::Local { results, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{MockVectorSearch, Neighbor, NeighborMetadata};
    use crate::index::Index;
    use crate::scoring::ScoringConfig;
    use crate::signature::SignatureExtractor;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;

    fn png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(48, 48, |x, y| {
            image::Rgb([(x * 5) as u8, 120, (y * 5) as u8])
        }));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn engine_with_query_image() -> SearchEngine {
        let extractor = SignatureExtractor::default();
        let sig = extractor.signature_from_bytes("shirt/1.png", &png()).unwrap();
        SearchEngine::new(
            Arc::new(Index::from_signatures(vec![sig])),
            ScoringConfig::default(),
            extractor,
        )
    }

    fn query(image: Option<Vec<u8>>, timeout: Duration) -> VectorQuery {
        VectorQuery {
            vector: FeatureVector::new(vec![0.0; 8], 8).unwrap(),
            neighbor_count: 5,
            color: None,
            image,
            min_similarity: 0.0,
            timeout,
        }
    }

    fn hits() -> Vec<Neighbor> {
        vec![Neighbor {
            id: "dp-1".into(),
            distance: Some(0.5),
            score: None,
            metadata: NeighborMetadata::default(),
        }]
    }

    #[tokio::test]
    async fn test_vector_answer() {
        let mock = MockVectorSearch::new(hits());
        let outcome = search_or_degrade(
            Some(&mock),
            &engine_with_query_image(),
            query(None, Duration::from_secs(1)),
        )
        .await
        .unwrap();
        assert_eq!(outcome.source(), ResultSource::Vector);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_local() {
        let mock = MockVectorSearch::failing("boom");
        let outcome = search_or_degrade(
            Some(&mock),
            &engine_with_query_image(),
            query(Some(png()), Duration::from_secs(1)),
        )
        .await
        .unwrap();
        match outcome {
            VectorOutcome::Local { results, reason } => {
                assert_eq!(results.preset, ScoringPreset::VertexFallback);
                assert_eq!(results.matches[0].filename, "shirt/1.png");
                assert!(reason.contains("boom"));
            }
            other => panic!("expected local outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_local() {
        let mock = MockVectorSearch::delayed(hits(), Duration::from_secs(5));
        let outcome = search_or_degrade(
            Some(&mock),
            &engine_with_query_image(),
            query(Some(png()), Duration::from_millis(20)),
        )
        .await
        .unwrap();
        assert_eq!(outcome.source(), ResultSource::Local);
    }

    #[tokio::test]
    async fn test_timeout_without_image_is_an_error() {
        let mock = MockVectorSearch::delayed(hits(), Duration::from_secs(5));
        let err = search_or_degrade(
            Some(&mock),
            &engine_with_query_image(),
            query(None, Duration::from_millis(20)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VistazoError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_uses_local() {
        let outcome = search_or_degrade(
            None,
            &engine_with_query_image(),
            query(Some(png()), Duration::from_secs(1)),
        )
        .await
        .unwrap();
        assert_eq!(outcome.source(), ResultSource::Local);
    }
}
