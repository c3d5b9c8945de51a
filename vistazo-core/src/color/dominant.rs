//! Dominant color extraction.
//!
//! Product photos are mostly garment-on-background, so both strategies
//! discard near-black and near-white pixels before voting. When nothing is
//! left to vote with, the color falls back to white instead of failing.

use std::collections::HashMap;
use std::str::FromStr;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Rgb;
use crate::error::VistazoError;
use crate::imaging;

/// Pixels darker than this mean brightness are treated as background.
pub const MIN_BRIGHTNESS: f64 = 20.0;

/// Pixels brighter than this mean brightness are treated as background.
pub const MAX_BRIGHTNESS: f64 = 235.0;

/// Color returned when no pixel survives background suppression.
pub const FALLBACK_COLOR: Rgb = Rgb::WHITE;

/// How the representative color of an image is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DominantColorStrategy {
    /// Quantize into cubic bins and pick the bin with the largest
    /// saturation-and-intensity weighted vote.
    BinVoting { sampling_size: u32, bin_size: u8 },
    /// Greedy clustering over the central part of the image, weighting pixels
    /// by their closeness to the center.
    CentralCluster {
        sampling_size: u32,
        /// Fraction of the image area analysed, centered.
        central_area: f64,
        /// Maximum per-channel difference to join a cluster.
        similarity: u8,
    },
}

impl DominantColorStrategy {
    pub const fn bin_voting() -> Self {
        Self::BinVoting {
            sampling_size: 50,
            bin_size: 32,
        }
    }

    pub const fn central_cluster() -> Self {
        Self::CentralCluster {
            sampling_size: 64,
            central_area: 0.6,
            similarity: 15,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BinVoting { .. } => "bins",
            Self::CentralCluster { .. } => "central",
        }
    }
}

impl Default for DominantColorStrategy {
    fn default() -> Self {
        Self::bin_voting()
    }
}

impl FromStr for DominantColorStrategy {
    type Err = VistazoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bins" | "bin-voting" => Ok(Self::bin_voting()),
            "central" | "central-cluster" => Ok(Self::central_cluster()),
            other => Err(VistazoError::InvalidConfig(format!(
                "unknown color strategy '{other}' (expected 'bins' or 'central')"
            ))),
        }
    }
}

/// Compute the dominant color of an image with the given strategy.
pub fn compute_dominant_color(image: &DynamicImage, strategy: DominantColorStrategy) -> Rgb {
    let result = match strategy {
        DominantColorStrategy::BinVoting {
            sampling_size,
            bin_size,
        } => bin_voting(&imaging::rgb_grid(image, sampling_size.max(1)), bin_size),
        DominantColorStrategy::CentralCluster {
            sampling_size,
            central_area,
            similarity,
        } => central_cluster(
            &imaging::rgb_grid(image, sampling_size.max(1)),
            central_area,
            similarity,
        ),
    };

    result.unwrap_or_else(|| {
        debug!(strategy = strategy.name(), "No eligible pixels, using fallback color");
        FALLBACK_COLOR
    })
}

fn is_background(pixel: [u8; 3]) -> bool {
    let brightness = Rgb::new(pixel[0], pixel[1], pixel[2]).mean();
    !(MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness)
}

#[derive(Default)]
struct Bin {
    significance: f64,
    weighted: [f64; 3],
    count: u32,
    sums: [u64; 3],
}

fn bin_voting(grid: &RgbImage, bin_size: u8) -> Option<Rgb> {
    let bin_size = bin_size.max(1);
    let mut slots: HashMap<[u8; 3], usize> = HashMap::new();
    let mut bins: Vec<Bin> = Vec::new();

    for pixel in grid.pixels() {
        let px = pixel.0;
        if is_background(px) {
            continue;
        }

        let key = [px[0] / bin_size, px[1] / bin_size, px[2] / bin_size];
        let slot = *slots.entry(key).or_insert_with(|| {
            bins.push(Bin::default());
            bins.len() - 1
        });
        let bin = &mut bins[slot];

        let max = f64::from(px[0].max(px[1]).max(px[2]));
        let min = f64::from(px[0].min(px[1]).min(px[2]));
        let significance = (max - min) * (1.0 + max / 255.0);

        bin.significance += significance;
        bin.count += 1;
        for c in 0..3 {
            bin.weighted[c] += f64::from(px[c]) * significance;
            bin.sums[c] += u64::from(px[c]);
        }
    }

    // Earliest bin wins ties in both passes.
    let mut best: Option<&Bin> = None;
    for bin in &bins {
        if best.map_or(true, |b| bin.significance > b.significance) {
            best = Some(bin);
        }
    }
    let best = best?;

    if best.significance > 0.0 {
        let w = best.significance;
        return Some(Rgb::from_f64(
            best.weighted[0] / w,
            best.weighted[1] / w,
            best.weighted[2] / w,
        ));
    }

    // Every eligible pixel is achromatic: fall back to the most populous bin.
    let mut populous: Option<&Bin> = None;
    for bin in &bins {
        if populous.map_or(true, |b| bin.count > b.count) {
            populous = Some(bin);
        }
    }
    let bin = populous?;
    let n = f64::from(bin.count);
    Some(Rgb::from_f64(
        bin.sums[0] as f64 / n,
        bin.sums[1] as f64 / n,
        bin.sums[2] as f64 / n,
    ))
}

struct Cluster {
    weight: f64,
    sums: [f64; 3],
}

impl Cluster {
    fn mean(&self) -> [f64; 3] {
        [
            self.sums[0] / self.weight,
            self.sums[1] / self.weight,
            self.sums[2] / self.weight,
        ]
    }
}

fn central_cluster(grid: &RgbImage, central_area: f64, similarity: u8) -> Option<Rgb> {
    let size = grid.width().min(grid.height());
    let fraction = central_area.clamp(0.0, 1.0).sqrt();
    let side = ((f64::from(size) * fraction).round() as u32).clamp(1, size);
    let offset = (size - side) / 2;

    let half = f64::from(size) / 2.0;
    let threshold = f64::from(similarity);
    let mut clusters: Vec<Cluster> = Vec::new();

    for y in offset..offset + side {
        for x in offset..offset + side {
            let px = grid.get_pixel(x, y).0;
            if is_background(px) {
                continue;
            }

            let dx = f64::from(x) + 0.5 - half;
            let dy = f64::from(y) + 0.5 - half;
            let weight = (1.0 - (dx * dx + dy * dy).sqrt() / half).max(0.0);
            if weight <= 0.0 {
                continue;
            }

            let color = [f64::from(px[0]), f64::from(px[1]), f64::from(px[2])];
            let joined = clusters.iter_mut().find(|cluster| {
                let mean = cluster.mean();
                (0..3).all(|c| (mean[c] - color[c]).abs() <= threshold)
            });

            match joined {
                Some(cluster) => {
                    cluster.weight += weight;
                    for c in 0..3 {
                        cluster.sums[c] += color[c] * weight;
                    }
                }
                None => clusters.push(Cluster {
                    weight,
                    sums: [color[0] * weight, color[1] * weight, color[2] * weight],
                }),
            }
        }
    }

    let mut best: Option<&Cluster> = None;
    for cluster in &clusters {
        if best.map_or(true, |b| cluster.weight > b.weight) {
            best = Some(cluster);
        }
    }
    let mean = best?.mean();
    Some(Rgb::from_f64(mean[0], mean[1], mean[2]))
}
