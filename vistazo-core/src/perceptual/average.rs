//! Average hash (aHash) over an 8×8 grayscale grid.

use super::Fingerprint;

/// Side length of the aHash grid.
pub const AHASH_SIZE: u32 = 8;

/// Compute the average hash of an 8×8 grayscale grid (row-major, 64 values).
///
/// Each bit is 1 iff the pixel is strictly brighter than the grid mean. A
/// perfectly flat grid therefore hashes to all zeros.
pub fn compute_average_hash(pixels: &[u8]) -> Fingerprint {
    debug_assert_eq!(pixels.len(), (AHASH_SIZE * AHASH_SIZE) as usize);

    let sum: u32 = pixels.iter().map(|&p| u32::from(p)).sum();
    let mean = f64::from(sum) / pixels.len().max(1) as f64;

    Fingerprint::from_bits(pixels.iter().map(|&p| f64::from(p) > mean))
}
