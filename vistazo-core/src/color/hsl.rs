//! HSL conversion and perceptual color distance.

use serde::{Deserialize, Serialize};

use super::Rgb;

/// Largest RGB Euclidean distance, `sqrt(3) * 255`.
pub const MAX_COLOR_DISTANCE: f64 = 441.672_955_930_063_7;

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// Standard RGB to HSL transform. Achromatic colors get `h = 0, s = 0`.
pub fn rgb_to_hsl(color: Rgb) -> Hsl {
    let r = f64::from(color.r) / 255.0;
    let g = f64::from(color.g) / 255.0;
    let b = f64::from(color.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
        };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: (h * 60.0) % 360.0,
        s: s * 100.0,
        l: l * 100.0,
    }
}

/// Circular hue difference in degrees, in `[0, 180]`.
pub fn hue_difference(a: f64, b: f64) -> f64 {
    let delta = (a - b).abs() % 360.0;
    delta.min(360.0 - delta)
}

/// Saturation-aware HSL distance, scaled to roughly the RGB Euclidean range.
///
/// The hue term is weighted by the mean saturation of both colors so that
/// hue noise on near-gray tones does not dominate.
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    let ha = rgb_to_hsl(a);
    let hb = rgb_to_hsl(b);

    let dh = hue_difference(ha.h, hb.h) / 180.0;
    let ds = (ha.s - hb.s).abs() / 100.0;
    let dl = (ha.l - hb.l).abs() / 100.0;

    let hue_weight = 2.0 * (ha.s + hb.s) / 200.0;

    (hue_weight * dh * dh + ds * ds + 0.5 * dl * dl).sqrt() * 255.0
}
