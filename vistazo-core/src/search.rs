//! Query pipeline: decode, extract a signature, score against the index,
//! deduplicate by product and keep the top results.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::index::Index;
use crate::scoring::{Scorer, ScoringConfig, ScoringPreset};
use crate::signature::{ImageSignature, SignatureExtractor};

/// Results returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Hard cap on results per query.
pub const MAX_LIMIT: usize = 50;

/// Filename recorded for query signatures.
const QUERY_FILENAME: &str = "query";

/// Per-query overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Replaces the preset's threshold.
    pub threshold: Option<u32>,
    /// Clamped to `1..=MAX_LIMIT`.
    pub limit: usize,
    /// Replaces the engine's scoring config with a named preset.
    pub preset: Option<ScoringPreset>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            limit: DEFAULT_LIMIT,
            preset: None,
        }
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub filename: String,
    pub product_id: Option<String>,
    /// Combined score; lower is more similar.
    pub distance: u32,
    pub phash_distance: u32,
    pub ahash_distance: u32,
    pub color_distance: Option<f64>,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: ImageSignature,
    pub preset: ScoringPreset,
    pub threshold: u32,
    pub matches: Vec<SearchMatch>,
    pub evaluated: usize,
    pub accepted: usize,
}

/// Brute-force similarity search over a shared [`Index`].
#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: Arc<Index>,
    config: ScoringConfig,
    extractor: SignatureExtractor,
}

impl SearchEngine {
    pub fn new(index: Arc<Index>, config: ScoringConfig, extractor: SignatureExtractor) -> Self {
        Self {
            index,
            config,
            extractor,
        }
    }

    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn extractor(&self) -> &SignatureExtractor {
        &self.extractor
    }

    /// Decode an encoded image and search with its signature.
    pub fn search_bytes(&self, bytes: &[u8], options: &SearchOptions) -> Result<SearchResults> {
        let query = self.extractor.signature_from_bytes(QUERY_FILENAME, bytes)?;
        Ok(self.search_signature(&query, options))
    }

    pub fn search_signature(
        &self,
        query: &ImageSignature,
        options: &SearchOptions,
    ) -> SearchResults {
        let started = Instant::now();
        let config = self.effective_config(options);
        let scorer = Scorer::new(config);
        let limit = options.limit.clamp(1, MAX_LIMIT);

        let ranking = scorer.rank(query, self.index.as_ref(), limit);
        let matches: Vec<SearchMatch> = ranking
            .matches
            .iter()
            .map(|scored| SearchMatch {
                filename: scored.signature.filename.clone(),
                product_id: scored.signature.product_id.clone(),
                distance: scored.combined_score,
                phash_distance: scored.phash_distance,
                ahash_distance: scored.ahash_distance,
                color_distance: scored.color_distance,
                group: scored.signature.product_group().to_string(),
            })
            .collect();

        debug!(
            evaluated = ranking.evaluated,
            accepted = ranking.accepted,
            returned = matches.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );

        SearchResults {
            query: query.clone(),
            preset: scorer.config().preset,
            threshold: scorer.config().threshold,
            matches,
            evaluated: ranking.evaluated,
            accepted: ranking.accepted,
        }
    }

    fn effective_config(&self, options: &SearchOptions) -> ScoringConfig {
        let config = match options.preset {
            Some(preset) if preset != self.config.preset => preset.config(),
            _ => self.config.clone(),
        };
        match options.threshold {
            Some(threshold) => config.with_threshold(threshold),
            None => config,
        }
    }
}
