//! False-positive gates applied on top of the combined score.
//!
//! Hashes alone confuse garments that share a silhouette but not a color.
//! Two gates push such candidates out of range: a hue gate for clearly
//! colored items and a tone gate that isolates black and white garments.

use serde::{Deserialize, Serialize};

use crate::color::{hue_difference, Hsl, Rgb};

/// Both colors need more saturation than this for hue to count.
pub const HUE_GATE_MIN_SATURATION: f64 = 25.0;

/// Query saturation above which the tighter hue tolerance applies.
pub const HUE_GATE_VIVID_SATURATION: f64 = 45.0;

/// Hue tolerance in degrees for vivid query colors.
pub const HUE_TOLERANCE_VIVID: f64 = 30.0;

/// Hue tolerance in degrees otherwise.
pub const HUE_TOLERANCE_MUTED: f64 = 45.0;

/// Coarse tone class of a dominant color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Black,
    White,
    Colored,
}

impl Tone {
    pub fn is_achromatic(self) -> bool {
        matches!(self, Tone::Black | Tone::White)
    }
}

/// Classify a color as black, white or colored.
///
/// Black: dark in HSL and in RGB mean, or very dark and nearly neutral.
/// White: the mirror image.
pub fn classify_tone(color: Rgb, hsl: Hsl) -> Tone {
    let mean = color.mean();
    let spread = color.spread();

    if (hsl.l < 30.0 && mean < 70.0) || (mean < 30.0 && spread < 20) {
        Tone::Black
    } else if (hsl.l > 70.0 && mean > 180.0) || (mean > 220.0 && spread < 20) {
        Tone::White
    } else {
        Tone::Colored
    }
}

/// Whether two clearly saturated colors sit too far apart on the hue wheel.
pub fn hue_mismatch(query: Hsl, candidate: Hsl) -> bool {
    if query.s <= HUE_GATE_MIN_SATURATION || candidate.s <= HUE_GATE_MIN_SATURATION {
        return false;
    }
    let tolerance = if query.s > HUE_GATE_VIVID_SATURATION {
        HUE_TOLERANCE_VIVID
    } else {
        HUE_TOLERANCE_MUTED
    };
    hue_difference(query.h, candidate.h) > tolerance
}

/// How two tones relate for penalty purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneConflict {
    None,
    /// One side is black or white, the other colored.
    Mixed,
    /// Black against white.
    Opposite,
}

pub fn tone_conflict(query: Tone, candidate: Tone) -> ToneConflict {
    match (query, candidate) {
        (Tone::Black, Tone::White) | (Tone::White, Tone::Black) => ToneConflict::Opposite,
        (a, b) if a.is_achromatic() != b.is_achromatic() => ToneConflict::Mixed,
        _ => ToneConflict::None,
    }
}
