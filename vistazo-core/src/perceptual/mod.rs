//! Perceptual hashing for images.
//!
//! Two 64-bit hash families are computed for every image:
//!
//! - **aHash**: mean threshold of an 8×8 grayscale thumbnail. Cheap and
//!   sensitive to overall light/dark layout.
//! - **pHash**: median threshold of the 8×8 low-frequency block of a 32×32
//!   DCT. Robust to re-encoding, mild resizing and compression.
//!
//! # Usage
//!
//! ```no_run
//! use vistazo_core::perceptual::PerceptualHasher;
//!
//! let bytes = std::fs::read("shirt.jpg").unwrap();
//! let image = vistazo_core::imaging::decode(&bytes).unwrap();
//! let hashes = PerceptualHasher::new().hash_image(&image);
//! println!("phash={} ahash={}", hashes.phash, hashes.ahash);
//! ```

mod average;
mod dct;
mod fingerprint;

pub use average::{compute_average_hash, AHASH_SIZE};
pub use dct::{compute_dct_hash, dct_2d, DCT_SIZE, LOW_FREQ_SIZE};
pub use fingerprint::{hamming_distance, Fingerprint, FINGERPRINT_HEX_LEN, FINGERPRINT_SIZE};

use image::DynamicImage;

use crate::imaging;

/// Both perceptual hashes of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualHashes {
    pub phash: Fingerprint,
    pub ahash: Fingerprint,
}

/// Computes aHash and pHash from decoded images.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptualHasher;

impl PerceptualHasher {
    pub fn new() -> Self {
        Self
    }

    pub fn hash_image(&self, image: &DynamicImage) -> PerceptualHashes {
        PerceptualHashes {
            phash: self.dct_hash(image),
            ahash: self.average_hash(image),
        }
    }

    pub fn average_hash(&self, image: &DynamicImage) -> Fingerprint {
        compute_average_hash(&imaging::grayscale_grid(image, AHASH_SIZE))
    }

    pub fn dct_hash(&self, image: &DynamicImage) -> Fingerprint {
        compute_dct_hash(&imaging::grayscale_grid(image, DCT_SIZE as u32))
    }
}
