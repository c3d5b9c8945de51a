//! Color signatures.
//!
//! Every indexed image carries one representative ("dominant") color. The
//! scorer compares colors in HSL space with a saturation-aware distance so
//! that hue only matters when both colors actually have one.

mod dominant;
mod hsl;
mod rgb;

pub use dominant::{
    compute_dominant_color, DominantColorStrategy, FALLBACK_COLOR, MAX_BRIGHTNESS, MIN_BRIGHTNESS,
};
pub use hsl::{color_distance, hue_difference, rgb_to_hsl, Hsl, MAX_COLOR_DISTANCE};
pub use rgb::Rgb;
