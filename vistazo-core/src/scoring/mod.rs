//! Candidate scoring, gating and ranking.
//!
//! A candidate's combined score blends three distances, each on a 0..=64
//! scale: pHash Hamming distance, aHash Hamming distance and the HSL color
//! distance normalized to 64. Gates then add large penalties for hue and
//! black/white conflicts, so a gated candidate can never pass a threshold.
//!
//! Acceptance needs both a combined score within the threshold and at least
//! one strong individual signal (pHash, aHash or color).

mod config;
mod gating;

pub use config::{
    GatePenalties, ScoringConfig, ScoringPreset, ScoringWeights, DEFAULT_COMBINED_THRESHOLD,
    DEFAULT_SINGLE_HASH_THRESHOLD,
};
pub use gating::{
    classify_tone, hue_mismatch, tone_conflict, Tone, ToneConflict, HUE_GATE_MIN_SATURATION,
    HUE_GATE_VIVID_SATURATION, HUE_TOLERANCE_MUTED, HUE_TOLERANCE_VIVID,
};

use std::collections::HashSet;

use crate::color::{color_distance, rgb_to_hsl, Hsl, Rgb, MAX_COLOR_DISTANCE};
use crate::perceptual::FINGERPRINT_SIZE;
use crate::signature::ImageSignature;

/// Upper end of each normalized distance term.
const TERM_SCALE: f64 = (FINGERPRINT_SIZE * 8) as f64;

/// One candidate with every intermediate distance kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub signature: &'a ImageSignature,
    pub phash_distance: u32,
    /// Falls back to the pHash distance when the candidate has no aHash.
    pub ahash_distance: u32,
    /// `None` when either side has no color.
    pub color_distance: Option<f64>,
    pub combined_score: u32,
    pub hue_mismatch: bool,
    pub query_tone: Option<Tone>,
    pub candidate_tone: Option<Tone>,
}

impl ScoredCandidate<'_> {
    pub fn is_black(&self) -> bool {
        self.candidate_tone == Some(Tone::Black)
    }

    pub fn is_white(&self) -> bool {
        self.candidate_tone == Some(Tone::White)
    }
}

/// Ranked, deduplicated candidates plus counters for the whole scan.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub matches: Vec<ScoredCandidate<'a>>,
    /// Candidates scored.
    pub evaluated: usize,
    /// Candidates accepted before product deduplication.
    pub accepted: usize,
}

/// Query-side values computed once per ranking.
struct QueryColor {
    rgb: Rgb,
    hsl: Hsl,
    tone: Tone,
}

impl QueryColor {
    fn of(signature: &ImageSignature) -> Option<Self> {
        signature.color.map(|rgb| {
            let hsl = rgb_to_hsl(rgb);
            Self {
                rgb,
                hsl,
                tone: classify_tone(rgb, hsl),
            }
        })
    }
}

/// Scores candidates against a query with one [`ScoringConfig`].
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score<'a>(
        &self,
        query: &ImageSignature,
        candidate: &'a ImageSignature,
    ) -> ScoredCandidate<'a> {
        self.score_with(query, QueryColor::of(query).as_ref(), candidate)
    }

    fn score_with<'a>(
        &self,
        query: &ImageSignature,
        query_color: Option<&QueryColor>,
        candidate: &'a ImageSignature,
    ) -> ScoredCandidate<'a> {
        let cfg = &self.config;
        let dp = query.phash.hamming_distance(candidate.phash);
        let da = match (query.ahash, candidate.ahash) {
            (Some(q), Some(c)) => q.hamming_distance(c),
            _ => dp,
        };

        let mut hue_flag = false;
        let mut candidate_tone = None;
        let mut penalty = 0u32;

        let (color_dist, color_norm) = match (query_color, candidate.color) {
            (Some(q), Some(rgb)) => {
                let hsl = rgb_to_hsl(rgb);
                let tone = classify_tone(rgb, hsl);
                candidate_tone = Some(tone);

                if cfg.hue_gate && hue_mismatch(q.hsl, hsl) {
                    hue_flag = true;
                    penalty += cfg.penalties.hue;
                }
                if cfg.tone_gate {
                    penalty += match tone_conflict(q.tone, tone) {
                        ToneConflict::None => 0,
                        ToneConflict::Mixed => cfg.penalties.tone_mixed,
                        ToneConflict::Opposite => cfg.penalties.tone_opposite,
                    };
                }

                let cd = color_distance(q.rgb, rgb);
                (Some(cd), (cd / MAX_COLOR_DISTANCE * TERM_SCALE).round())
            }
            // Legacy entries: no color term, no gates.
            _ => (None, f64::from(dp)),
        };

        let weighted = f64::from(dp) * cfg.weights.phash
            + f64::from(da) * cfg.weights.ahash
            + color_norm * cfg.weights.color;

        ScoredCandidate {
            signature: candidate,
            phash_distance: dp,
            ahash_distance: da,
            color_distance: color_dist,
            combined_score: (weighted.round().max(0.0) as u32).saturating_add(penalty),
            hue_mismatch: hue_flag,
            query_tone: query_color.map(|q| q.tone),
            candidate_tone,
        }
    }

    /// Threshold check plus at least one strong individual signal.
    pub fn accepts(&self, candidate: &ScoredCandidate<'_>) -> bool {
        let cfg = &self.config;
        candidate.combined_score <= cfg.threshold
            && (candidate.phash_distance <= cfg.phash_strict
                || candidate.ahash_distance <= cfg.ahash_strict
                || candidate
                    .color_distance
                    .is_some_and(|cd| cd <= cfg.color_accept))
    }

    /// Score every candidate, keep the accepted ones, sort ascending by
    /// combined score (ties keep index order) and keep the best candidate per
    /// product group, up to `limit`.
    pub fn rank<'a, I>(&self, query: &ImageSignature, candidates: I, limit: usize) -> Ranking<'a>
    where
        I: IntoIterator<Item = &'a ImageSignature>,
    {
        let query_color = QueryColor::of(query);
        let mut evaluated = 0;
        let mut accepted: Vec<ScoredCandidate<'a>> = candidates
            .into_iter()
            .map(|candidate| {
                evaluated += 1;
                self.score_with(query, query_color.as_ref(), candidate)
            })
            .filter(|scored| self.accepts(scored))
            .collect();
        let accepted_count = accepted.len();

        accepted.sort_by_key(|scored| scored.combined_score);

        let mut seen = HashSet::new();
        let matches = accepted
            .into_iter()
            .filter(|scored| seen.insert(scored.signature.product_group()))
            .take(limit)
            .collect();

        Ranking {
            matches,
            evaluated,
            accepted: accepted_count,
        }
    }
}
