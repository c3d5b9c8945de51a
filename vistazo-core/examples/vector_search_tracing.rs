//! Example showing the vector search path with tracing enabled.
//!
//! Uses the HTTP provider when `VECTOR_SEARCH_URL` is set, otherwise a
//! failing mock so the local fallback is exercised.
//!
//! Run with: cargo run -p vistazo-core --example vector_search_tracing

use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, RgbImage};
use tracing_subscriber::{fmt, EnvFilter};
use vistazo_core::embedding::{
    search_or_degrade, FeatureVector, MockVectorSearch, NeighborQueryConfig,
    VectorOutcome, VectorProviderConfig, VectorQuery, VectorSearch, VectorSearchFactory,
};
use vistazo_core::{Index, ScoringConfig, SearchEngine, SignatureExtractor};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("vistazo_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Vector Search Tracing Demo ===\n");

    let provider: Arc<dyn VectorSearch> = match VectorProviderConfig::from_env()
        .and_then(VectorSearchFactory::create)
    {
        Ok(p) => p,
        Err(e) => {
            println!("No remote provider ({e}); using a failing mock\n");
            Arc::new(MockVectorSearch::failing("demo provider offline"))
        }
    };
    println!("Provider: {}\n", provider.source());

    // A one-image local index so the fallback has something to find.
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, 90, (y * 4) as u8])
    }));
    let mut png = std::io::Cursor::new(Vec::new());
    if let Err(e) = img.write_to(&mut png, image::ImageFormat::Png) {
        eprintln!("Failed to encode demo image: {e}");
        return;
    }
    let extractor = SignatureExtractor::default();
    let engine = SearchEngine::new(
        Arc::new(Index::from_signatures(vec![
            extractor.signature_from_image("demo/gradient.png", &img)
        ])),
        ScoringConfig::default(),
        extractor,
    );

    let limits = NeighborQueryConfig::from_env();
    let vector = match FeatureVector::new(vec![0.01; limits.expected_dimensions], limits.expected_dimensions) {
        Ok(v) => v.l2_normalize(),
        Err(e) => {
            eprintln!("Invalid vector: {e}");
            return;
        }
    };

    let query = VectorQuery {
        vector,
        neighbor_count: limits.neighbor_count(None),
        color: None,
        image: Some(png.into_inner()),
        min_similarity: limits.min_similarity,
        timeout: Duration::from_secs(5),
    };

    match search_or_degrade(Some(provider.as_ref()), &engine, query).await {
        Ok(VectorOutcome::Vector(ranking)) => {
            println!("\n✅ Vector results: {}", ranking.results_after_filter);
            for hit in ranking.results {
                println!("   {} similarity={:.3}", hit.id, hit.similarity);
            }
        }
        Ok(VectorOutcome::Local { results, reason }) => {
            println!("\n⚠️  Fell back to local search ({reason})");
            for hit in results.matches {
                println!("   {} distance={}", hit.filename, hit.distance);
            }
        }
        Err(e) => println!("\n❌ Failed: {e}"),
    }
}
