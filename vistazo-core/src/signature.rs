//! Per-image signatures: the unit stored in the index and compared at query
//! time.

use std::fmt;
use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::color::{compute_dominant_color, DominantColorStrategy, Rgb};
use crate::error::Result;
use crate::imaging;
use crate::perceptual::{Fingerprint, PerceptualHasher};

/// Hashes and color of one catalog image.
///
/// `ahash` and `color` are optional only because older snapshots were written
/// without them; freshly extracted signatures always carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSignature {
    /// Path relative to the index root, `/`-separated. Unique in an index.
    pub filename: String,
    pub phash: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ahash: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(rename = "productId", default)]
    pub product_id: Option<String>,
}

impl ImageSignature {
    pub fn with_product_id(mut self, product_id: Option<String>) -> Self {
        self.product_id = product_id;
        self
    }

    /// Key used to collapse several photos of the same product into one hit.
    pub fn product_group(&self) -> ProductGroup {
        if let Some(id) = &self.product_id {
            return ProductGroup::Product(id.clone());
        }

        let mut segments = self.filename.split('/').filter(|s| !s.is_empty());
        let first = segments.next().unwrap_or_default();
        if segments.next().is_some() {
            return ProductGroup::Folder(first.to_string());
        }

        let stem = Path::new(first)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(first);
        ProductGroup::File(stem.to_string())
    }
}

/// Deduplication key for search results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductGroup {
    /// Explicit catalog product id.
    Product(String),
    /// Top-level folder of the filename.
    Folder(String),
    /// Stem of a filename at the index root.
    File(String),
}

impl ProductGroup {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Product(s) | Self::Folder(s) | Self::File(s) => s,
        }
    }
}

impl fmt::Display for ProductGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds [`ImageSignature`]s from encoded bytes or decoded images.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureExtractor {
    hasher: PerceptualHasher,
    strategy: DominantColorStrategy,
}

impl SignatureExtractor {
    pub fn new(strategy: DominantColorStrategy) -> Self {
        Self {
            hasher: PerceptualHasher::new(),
            strategy,
        }
    }

    pub fn strategy(&self) -> DominantColorStrategy {
        self.strategy
    }

    pub fn signature_from_bytes(&self, filename: &str, bytes: &[u8]) -> Result<ImageSignature> {
        let image = imaging::decode(bytes)?;
        Ok(self.signature_from_image(filename, &image))
    }

    pub fn signature_from_image(&self, filename: &str, image: &DynamicImage) -> ImageSignature {
        let hashes = self.hasher.hash_image(image);
        ImageSignature {
            filename: filename.to_string(),
            phash: hashes.phash,
            ahash: Some(hashes.ahash),
            color: Some(compute_dominant_color(image, self.strategy)),
            product_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn signature(filename: &str, product_id: Option<&str>) -> ImageSignature {
        ImageSignature {
            filename: filename.to_string(),
            phash: Fingerprint::new(0),
            ahash: None,
            color: None,
            product_id: product_id.map(String::from),
        }
    }

    #[test]
    fn test_product_group_prefers_product_id() {
        let sig = signature("shirts/front.jpg", Some("sku-1"));
        assert_eq!(sig.product_group(), ProductGroup::Product("sku-1".into()));
    }

    #[test]
    fn test_product_group_uses_first_folder() {
        let sig = signature("blue-hoodie/side/2.png", None);
        assert_eq!(sig.product_group(), ProductGroup::Folder("blue-hoodie".into()));
    }

    #[test]
    fn test_product_group_uses_stem_at_root() {
        let sig = signature("cap.webp", None);
        assert_eq!(sig.product_group(), ProductGroup::File("cap".into()));
        assert_eq!(sig.product_group().to_string(), "cap");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let sig = ImageSignature {
            filename: "a/b.jpg".into(),
            phash: Fingerprint::new(0xff),
            ahash: Some(Fingerprint::new(1)),
            color: Some(Rgb::new(16, 16, 16)),
            product_id: None,
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["phash"], "00000000000000ff");
        assert_eq!(json["ahash"], "0000000000000001");
        assert_eq!(json["color"], "101010");
        assert!(json["productId"].is_null());
    }

    #[test]
    fn test_legacy_entry_without_ahash_or_color() {
        let sig: ImageSignature =
            serde_json::from_str(r#"{"filename":"x.jpg","phash":"0123456789ABCDEF"}"#).unwrap();
        assert_eq!(sig.phash.to_hex(), "0123456789abcdef");
        assert!(sig.ahash.is_none());
        assert!(sig.color.is_none());
        assert!(sig.product_id.is_none());
    }

    #[test]
    fn test_extractor_fills_every_field() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, 90])
        }));
        let sig = SignatureExtractor::default().signature_from_image("g.png", &img);
        assert_eq!(sig.filename, "g.png");
        assert!(sig.ahash.is_some());
        assert!(sig.color.is_some());
    }

    #[test]
    fn test_extractor_rejects_garbage_bytes() {
        let result = SignatureExtractor::default().signature_from_bytes("bad.jpg", b"nope");
        assert!(result.is_err());
    }
}
