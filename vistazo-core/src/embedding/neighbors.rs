//! Turning raw nearest-neighbor hits into ranked results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::payload::DEFAULT_DIMENSIONS;

/// Neighbors returned when the request does not say.
pub const DEFAULT_NEIGHBOR_COUNT: usize = 10;

/// Upper bound on neighbors per request.
pub const DEFAULT_MAX_NEIGHBORS: usize = 20;

/// Similarity multiplier when the neighbor's color differs from the query's.
pub const COLOR_MISMATCH_FACTOR: f64 = 0.8;

const GCS_PREFIX: &str = "gs://";
const GCS_HTTPS_BASE: &str = "https://storage.googleapis.com";

/// Metadata a vector index may attach to a datapoint. All optional.
///
/// Indexes disagree on key spellings and some attach several at once, so
/// each spelling is read separately and the first non-empty one wins:
/// `gcs_uri` > `gs_uri` > `uri`, `filename` > `file`, `image_url` > `url`,
/// `productId` > `product_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMetadata")]
pub struct NeighborMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Deserialize)]
struct RawMetadata {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    gcs_uri: Option<String>,
    #[serde(default)]
    gs_uri: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "productId")]
    product_id_camel: Option<String>,
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

fn first_present(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl From<RawMetadata> for NeighborMetadata {
    fn from(raw: RawMetadata) -> Self {
        Self {
            filename: first_present([raw.filename, raw.file]),
            gcs_uri: first_present([raw.gcs_uri, raw.gs_uri, raw.uri]),
            image_url: first_present([raw.image_url, raw.url]),
            product_id: first_present([raw.product_id_camel, raw.product_id]),
            color: first_present([raw.color]),
        }
    }
}

/// One raw hit from the vector index.
///
/// `distance` is lower-is-better. Services that already normalize send a
/// `score` in `[0, 1]` instead; distance wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: NeighborMetadata,
}

impl Neighbor {
    /// Similarity in `[0, 1]` from the distance, else the score, else 0.
    pub fn similarity(&self) -> f64 {
        match (self.distance, self.score) {
            (Some(_), _) => similarity_from_distance(self.distance),
            (None, Some(score)) if score.is_finite() => score.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedNeighbor {
    pub id: String,
    pub distance: Option<f64>,
    /// In `(0, 1]`, higher is more similar.
    pub similarity: f64,
    pub product_id: Option<String>,
    pub filename: Option<String>,
    pub image_url: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborRanking {
    pub results: Vec<RankedNeighbor>,
    pub results_before_filter: usize,
    pub results_after_filter: usize,
}

/// Limits applied to vector queries, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborQueryConfig {
    pub expected_dimensions: usize,
    pub max_neighbors: usize,
    pub min_similarity: f64,
}

impl Default for NeighborQueryConfig {
    fn default() -> Self {
        Self {
            expected_dimensions: DEFAULT_DIMENSIONS,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            min_similarity: 0.0,
        }
    }
}

impl NeighborQueryConfig {
    /// Reads `EXPECTED_DIMENSIONS`, `MAX_NEIGHBORS` and
    /// `IMAGE_MATCH_SIMILARITY_THRESHOLD`; unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            expected_dimensions: env_or("EXPECTED_DIMENSIONS", defaults.expected_dimensions),
            max_neighbors: env_or("MAX_NEIGHBORS", defaults.max_neighbors).max(1),
            min_similarity: env_or("IMAGE_MATCH_SIMILARITY_THRESHOLD", defaults.min_similarity),
        }
    }

    /// Requested count (default 10), clamped to `1..=max_neighbors`.
    pub fn neighbor_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(DEFAULT_NEIGHBOR_COUNT)
            .clamp(1, self.max_neighbors.max(1))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable environment value");
            default
        }),
        Err(_) => default,
    }
}

/// `1 / (1 + |distance|)`; a missing distance scores 0.
pub fn similarity_from_distance(distance: Option<f64>) -> f64 {
    match distance {
        Some(d) if d.is_finite() => 1.0 / (1.0 + d.abs()),
        _ => 0.0,
    }
}

/// Rewrite `gs://bucket/path` to its public HTTPS URL. Other URIs, and
/// `gs://` URIs without an object path, are returned unchanged.
pub fn gs_to_https(uri: &str) -> String {
    match uri.strip_prefix(GCS_PREFIX).and_then(|rest| rest.split_once('/')) {
        Some((bucket, object)) => format!("{GCS_HTTPS_BASE}/{bucket}/{object}"),
        None => uri.to_string(),
    }
}

/// Score, color-bias, filter and sort neighbors by descending similarity.
pub fn rank_neighbors(
    neighbors: Vec<Neighbor>,
    query_color: Option<&str>,
    min_similarity: f64,
) -> NeighborRanking {
    let before = neighbors.len();
    let mut results: Vec<RankedNeighbor> = neighbors
        .into_iter()
        .filter_map(|neighbor| {
            let mut similarity = neighbor.similarity();
            if let (Some(query), Some(color)) = (query_color, neighbor.metadata.color.as_deref()) {
                if !query.eq_ignore_ascii_case(color) {
                    similarity *= COLOR_MISMATCH_FACTOR;
                }
            }
            if similarity < min_similarity {
                return None;
            }

            let meta = neighbor.metadata;
            let image_url = meta.gcs_uri.as_deref().map(gs_to_https).or(meta.image_url);
            Some(RankedNeighbor {
                id: neighbor.id,
                distance: neighbor.distance,
                similarity,
                product_id: meta.product_id,
                filename: meta.filename,
                image_url,
                color: meta.color,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });

    NeighborRanking {
        results_before_filter: before,
        results_after_filter: results.len(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(id: &str, distance: Option<f64>, color: Option<&str>) -> Neighbor {
        Neighbor {
            id: id.to_string(),
            distance,
            score: None,
            metadata: NeighborMetadata {
                color: color.map(String::from),
                ..NeighborMetadata::default()
            },
        }
    }

    #[test]
    fn test_similarity_from_distance() {
        assert_eq!(similarity_from_distance(Some(0.0)), 1.0);
        assert_eq!(similarity_from_distance(Some(1.0)), 0.5);
        assert_eq!(similarity_from_distance(Some(-1.0)), 0.5);
        assert_eq!(similarity_from_distance(None), 0.0);
    }

    #[test]
    fn test_gs_to_https() {
        assert_eq!(
            gs_to_https("gs://bucket/shirts/a.jpg"),
            "https://storage.googleapis.com/bucket/shirts/a.jpg"
        );
        assert_eq!(gs_to_https("gs://bucket"), "gs://bucket");
        assert_eq!(gs_to_https("https://x/y.jpg"), "https://x/y.jpg");
    }

    #[test]
    fn test_color_bias_and_sorting() {
        let ranking = rank_neighbors(
            vec![
                neighbor("a", Some(1.0), Some("Red")),
                neighbor("b", Some(1.0), Some("blue")),
                neighbor("c", Some(0.0), None),
            ],
            Some("red"),
            0.0,
        );
        let ids: Vec<_> = ranking.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert!((ranking.results[2].similarity - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_min_similarity_filter() {
        let ranking = rank_neighbors(
            vec![neighbor("near", Some(0.1), None), neighbor("far", Some(9.0), None)],
            None,
            0.5,
        );
        assert_eq!(ranking.results_before_filter, 2);
        assert_eq!(ranking.results_after_filter, 1);
        assert_eq!(ranking.results[0].id, "near");
    }

    #[test]
    fn test_image_url_prefers_gcs_uri() {
        let n: Neighbor = serde_json::from_str(
            r#"{"id": "x", "distance": 0.2,
                "metadata": {"gs_uri": "gs://b/o.png", "url": "https://cdn/o.png", "product_id": "p1"}}"#,
        )
        .unwrap();
        let ranking = rank_neighbors(vec![n], None, 0.0);
        let hit = &ranking.results[0];
        assert_eq!(hit.image_url.as_deref(), Some("https://storage.googleapis.com/b/o.png"));
        assert_eq!(hit.product_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_neighbor_count_clamp() {
        let cfg = NeighborQueryConfig::default();
        assert_eq!(cfg.neighbor_count(None), 10);
        assert_eq!(cfg.neighbor_count(Some(0)), 1);
        assert_eq!(cfg.neighbor_count(Some(500)), 20);
    }

    #[test]
    fn test_score_only_hits_are_ranked() {
        let hits: Vec<Neighbor> = serde_json::from_str(
            r#"[{"id": "low", "score": 0.3}, {"id": "high", "score": 0.9}, {"id": "bare"}]"#,
        )
        .unwrap();
        let ranking = rank_neighbors(hits, None, 0.0);
        let ids: Vec<_> = ranking.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["high", "low", "bare"]);
        assert!((ranking.results[0].similarity - 0.9).abs() < 1e-12);
        assert_eq!(ranking.results[2].similarity, 0.0);
    }

    #[test]
    fn test_distance_wins_over_score() {
        let n: Neighbor =
            serde_json::from_str(r#"{"id": "x", "distance": 1.0, "score": 0.99}"#).unwrap();
        assert_eq!(n.similarity(), 0.5);
    }

    #[test]
    fn test_metadata_with_duplicate_spellings() {
        let n: Neighbor = serde_json::from_str(
            r#"{"id": "x", "distance": 0.1, "metadata": {
                "filename": "a.jpg", "file": "b.jpg",
                "uri": "gs://b/uri.png", "gcs_uri": "gs://b/gcs.png", "gs_uri": "gs://b/gs.png",
                "url": "https://cdn/u.png", "image_url": "https://cdn/i.png",
                "product_id": "p-snake", "productId": "p-camel"
            }}"#,
        )
        .unwrap();
        assert_eq!(n.metadata.filename.as_deref(), Some("a.jpg"));
        assert_eq!(n.metadata.gcs_uri.as_deref(), Some("gs://b/gcs.png"));
        assert_eq!(n.metadata.image_url.as_deref(), Some("https://cdn/i.png"));
        assert_eq!(n.metadata.product_id.as_deref(), Some("p-camel"));
    }

    #[test]
    fn test_metadata_skips_empty_spellings() {
        let n: Neighbor = serde_json::from_str(
            r#"{"id": "x", "metadata": {"filename": "", "file": "shirts/a.jpg", "gcs_uri": " ", "uri": "gs://b/a.jpg"}}"#,
        )
        .unwrap();
        assert_eq!(n.metadata.filename.as_deref(), Some("shirts/a.jpg"));
        assert_eq!(n.metadata.gcs_uri.as_deref(), Some("gs://b/a.jpg"));
    }
}
