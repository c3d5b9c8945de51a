//! DCT-based perceptual hash (pHash) over a 32×32 grayscale grid.
//!
//! The transform is the orthonormal type-II DCT, applied separably (rows,
//! then columns) with a precomputed cosine table. Separability only changes
//! the evaluation order of the double sum; the coefficients are the same.

use std::f64::consts::PI;

use super::Fingerprint;

/// Side length of the DCT input grid.
pub const DCT_SIZE: usize = 32;

/// Side length of the low-frequency block kept for the hash.
pub const LOW_FREQ_SIZE: usize = 8;

/// Compute the DCT hash of a 32×32 grayscale grid (row-major, 1024 values).
pub fn compute_dct_hash(pixels: &[u8]) -> Fingerprint {
    debug_assert_eq!(pixels.len(), DCT_SIZE * DCT_SIZE);

    let input: Vec<f64> = pixels.iter().map(|&p| f64::from(p)).collect();
    let coefficients = dct_2d(&input, DCT_SIZE);

    let mut low = Vec::with_capacity(LOW_FREQ_SIZE * LOW_FREQ_SIZE);
    for v in 0..LOW_FREQ_SIZE {
        for u in 0..LOW_FREQ_SIZE {
            low.push(coefficients[v * DCT_SIZE + u]);
        }
    }

    let median = median(&low);
    Fingerprint::from_bits(low.iter().map(|&c| c > median))
}

/// Orthonormal 2D DCT-II of a `size`×`size` row-major grid.
///
/// Output index `v * size + u` holds the coefficient for vertical frequency
/// `v` and horizontal frequency `u`.
pub fn dct_2d(pixels: &[f64], size: usize) -> Vec<f64> {
    let table = cosine_table(size);
    let scale = |k: usize| {
        if k == 0 {
            (1.0 / size as f64).sqrt()
        } else {
            (2.0 / size as f64).sqrt()
        }
    };

    // Rows: temp[y][u] = sum_x pixels[y][x] * cos(...)
    let mut temp = vec![0.0; size * size];
    for y in 0..size {
        for u in 0..size {
            let mut sum = 0.0;
            for x in 0..size {
                sum += pixels[y * size + x] * table[u * size + x];
            }
            temp[y * size + u] = sum * scale(u);
        }
    }

    // Columns: out[v][u] = sum_y temp[y][u] * cos(...)
    let mut out = vec![0.0; size * size];
    for v in 0..size {
        for u in 0..size {
            let mut sum = 0.0;
            for y in 0..size {
                sum += temp[y * size + u] * table[v * size + y];
            }
            out[v * size + u] = sum * scale(v);
        }
    }

    out
}

fn cosine_table(size: usize) -> Vec<f64> {
    let mut table = vec![0.0; size * size];
    for k in 0..size {
        for n in 0..size {
            table[k * size + n] =
                ((2 * n + 1) as f64 * k as f64 * PI / (2.0 * size as f64)).cos();
        }
    }
    table
}

/// Median of a non-empty slice; the mean of the two middle values for even
/// lengths.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
