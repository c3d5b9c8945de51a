//! Scoring parameters and named presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VistazoError;

/// Default acceptance threshold for presets that combine hashes and color.
pub const DEFAULT_COMBINED_THRESHOLD: u32 = 24;

/// Default acceptance threshold for the pHash-only preset.
pub const DEFAULT_SINGLE_HASH_THRESHOLD: u32 = 12;

/// Named scoring configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPreset {
    /// Hashes plus color, both gates on.
    #[default]
    Strict,
    /// Looser thresholds, tone gate off.
    Permissive,
    /// pHash only; used when the vector path degrades to local search.
    VertexFallback,
}

impl ScoringPreset {
    pub const ALL: [ScoringPreset; 3] = [
        ScoringPreset::Strict,
        ScoringPreset::Permissive,
        ScoringPreset::VertexFallback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
            Self::VertexFallback => "vertex-fallback",
        }
    }

    pub fn config(self) -> ScoringConfig {
        ScoringConfig::preset(self)
    }
}

impl fmt::Display for ScoringPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringPreset {
    type Err = VistazoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            "vertex-fallback" | "vertex_fallback" => Ok(Self::VertexFallback),
            other => Err(VistazoError::InvalidConfig(format!(
                "unknown scoring preset '{other}' (expected strict, permissive or vertex-fallback)"
            ))),
        }
    }
}

/// Weights of the three distance terms in the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub phash: f64,
    pub ahash: f64,
    pub color: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            phash: 0.4,
            ahash: 0.3,
            color: 0.3,
        }
    }
}

/// Additive penalties applied by the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePenalties {
    pub hue: u32,
    pub tone_mixed: u32,
    pub tone_opposite: u32,
}

impl Default for GatePenalties {
    fn default() -> Self {
        Self {
            hue: 100,
            tone_mixed: 500,
            tone_opposite: 1000,
        }
    }
}

/// Everything the scorer needs to rank and accept candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Preset this configuration started from; reported alongside results.
    pub preset: ScoringPreset,
    pub weights: ScoringWeights,
    /// Maximum combined score (after penalties) for a candidate to be kept.
    pub threshold: u32,
    /// Any one of these three makes an in-threshold candidate acceptable.
    pub phash_strict: u32,
    pub ahash_strict: u32,
    pub color_accept: f64,
    pub hue_gate: bool,
    pub tone_gate: bool,
    pub penalties: GatePenalties,
}

impl ScoringConfig {
    pub fn preset(preset: ScoringPreset) -> Self {
        match preset {
            ScoringPreset::Strict => Self {
                preset,
                weights: ScoringWeights::default(),
                threshold: DEFAULT_COMBINED_THRESHOLD,
                phash_strict: 12,
                ahash_strict: 10,
                color_accept: 30.0,
                hue_gate: true,
                tone_gate: true,
                penalties: GatePenalties::default(),
            },
            ScoringPreset::Permissive => Self {
                preset,
                weights: ScoringWeights::default(),
                threshold: 30,
                phash_strict: 20,
                ahash_strict: 16,
                color_accept: 60.0,
                hue_gate: true,
                tone_gate: false,
                penalties: GatePenalties::default(),
            },
            ScoringPreset::VertexFallback => Self {
                preset,
                weights: ScoringWeights {
                    phash: 1.0,
                    ahash: 0.0,
                    color: 0.0,
                },
                threshold: DEFAULT_SINGLE_HASH_THRESHOLD,
                phash_strict: 12,
                ahash_strict: 0,
                color_accept: 0.0,
                hue_gate: true,
                tone_gate: true,
                penalties: GatePenalties::default(),
            },
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::preset(ScoringPreset::default())
    }
}
