//! Vistazo Core - visual similarity search for product catalogs
//!
//! Given a query photo, Vistazo ranks catalog images by how alike they look,
//! using compact per-image signatures instead of learned embeddings.
//!
//! # Features
//!
//! - 64-bit perceptual hashes: 8×8 average hash and 32×32 DCT hash
//! - Dominant color extraction with background suppression
//! - Saturation-aware HSL color distance
//! - Hue and black/white gates that suppress look-alike false positives
//! - Flat JSON index snapshots, built offline in parallel
//! - Optional external vector search with a local fallback (feature `network`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vistazo_core::{Index, ScoringConfig, SearchEngine, SearchOptions, SignatureExtractor};
//!
//! # fn example() -> vistazo_core::Result<()> {
//! let index = Arc::new(Index::load("index.json")?);
//! let engine = SearchEngine::new(index, ScoringConfig::default(), SignatureExtractor::default());
//!
//! let bytes = std::fs::read("query.jpg")?;
//! let results = engine.search_bytes(&bytes, &SearchOptions::default())?;
//! for hit in &results.matches {
//!     println!("{} (distance {})", hit.filename, hit.distance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod color;
pub mod embedding;
pub mod error;
pub mod imaging;
pub mod index;
pub mod perceptual;
pub mod scoring;
pub mod search;
pub mod signature;

// Re-export main types for convenience
pub use catalog::{Catalog, Product};
pub use color::{color_distance, compute_dominant_color, rgb_to_hsl, DominantColorStrategy, Hsl, Rgb};
pub use error::{Result, VistazoError};
pub use index::{BuildReport, Index, IndexBuilder};
pub use perceptual::{hamming_distance, Fingerprint, PerceptualHasher};
pub use scoring::{ScoredCandidate, Scorer, ScoringConfig, ScoringPreset, Tone};
pub use search::{SearchEngine, SearchMatch, SearchOptions, SearchResults, DEFAULT_LIMIT, MAX_LIMIT};
pub use signature::{ImageSignature, ProductGroup, SignatureExtractor};

#[cfg(feature = "network")]
pub use embedding::{MockVectorSearch, VectorSearch};
