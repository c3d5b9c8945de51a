//! Image decoding and fixed-size resampling.
//!
//! Every signature is computed from small square grids, so this module only
//! needs to turn arbitrary encoded bytes into an N×N luma or RGB buffer.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::error::{Result, VistazoError};

/// Resampling filter used for every fixed-size grid.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Decode raw image bytes (JPEG, PNG, GIF, WebP, BMP, TIFF).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(VistazoError::DecodeError("empty image buffer".into()));
    }

    image::load_from_memory(bytes).map_err(|e| VistazoError::DecodeError(e.to_string()))
}

/// Check if the provided bytes appear to be a supported image format.
pub fn is_supported_format(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Resize to exactly `size`×`size` and convert to 8-bit grayscale, row-major.
pub fn grayscale_grid(image: &DynamicImage, size: u32) -> Vec<u8> {
    image
        .resize_exact(size, size, RESAMPLE_FILTER)
        .to_luma8()
        .into_raw()
}

/// Resize to exactly `size`×`size` and drop the alpha channel.
pub fn rgb_grid(image: &DynamicImage, size: u32) -> RgbImage {
    image.resize_exact(size, size, RESAMPLE_FILTER).to_rgb8()
}

/// Decode a `data:<mime>;base64,<payload>` URI or a bare base64 payload.
pub fn decode_data_uri(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                VistazoError::DecodeError("data URI is missing the ',' separator".into())
            })?;
            if !header.ends_with(";base64") {
                return Err(VistazoError::DecodeError(
                    "only base64 data URIs are supported".into(),
                ));
            }
            data
        }
        None => trimmed,
    };

    BASE64
        .decode(payload)
        .map_err(|e| VistazoError::DecodeError(format!("invalid base64 payload: {e}")))
}
