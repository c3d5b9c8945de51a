//! Vector command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use vistazo_core::embedding::{
    search_or_degrade, EmbeddingPayload, FeatureVector, NeighborQueryConfig, VectorOutcome,
    VectorProviderConfig, VectorQuery, VectorSearchFactory,
};
use vistazo_core::{Index, ScoringConfig, SearchEngine, SignatureExtractor};

use crate::utils;

pub struct VectorArgs {
    pub embedding: PathBuf,
    pub neighbors: Option<usize>,
    pub color: Option<String>,
    pub image: Option<PathBuf>,
    pub index: PathBuf,
    pub normalize: bool,
    pub timeout_secs: u64,
}

/// Execute the vector command.
pub async fn execute(args: VectorArgs) -> Result<()> {
    let limits = NeighborQueryConfig::from_env();

    let raw = std::fs::read_to_string(&args.embedding)
        .with_context(|| format!("Failed to read embedding: {}", args.embedding.display()))?;
    let payload = EmbeddingPayload::from_json(&raw)?;
    let mut vector = FeatureVector::from_payload(payload, limits.expected_dimensions)?;
    if args.normalize {
        vector = vector.l2_normalize();
    }

    let provider = match VectorProviderConfig::from_env().and_then(VectorSearchFactory::create) {
        Ok(provider) => Some(provider),
        Err(e) if args.image.is_some() => {
            warn!(error = %e, "Vector search not configured");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let image = args.image.as_deref().map(utils::read_image).transpose()?;
    // The local index is only needed when the vector path can degrade.
    let index = if image.is_some() {
        utils::load_index(&args.index)?
    } else {
        Arc::new(Index::default())
    };
    let engine = SearchEngine::new(index, ScoringConfig::default(), SignatureExtractor::default());

    let query = VectorQuery {
        vector,
        neighbor_count: limits.neighbor_count(args.neighbors),
        color: args.color.clone(),
        image,
        min_similarity: limits.min_similarity,
        timeout: Duration::from_secs(args.timeout_secs.max(1)),
    };

    let outcome = search_or_degrade(provider.as_deref(), &engine, query).await?;
    info!(source = ?outcome.source(), "Vector query complete");

    println!();
    match outcome {
        VectorOutcome::Vector(ranking) => {
            println!(
                "{} {} of {} neighbors kept",
                "Vector search:".green().bold(),
                ranking.results_after_filter,
                ranking.results_before_filter
            );
            for (rank, hit) in ranking.results.iter().enumerate() {
                println!(
                    "{:>3}. {:.3}  {}  {}",
                    rank + 1,
                    hit.similarity,
                    hit.id,
                    utils::or_dash(hit.product_id.as_deref()).cyan()
                );
                if let Some(url) = &hit.image_url {
                    println!("     {}", url.dimmed());
                }
            }
        }
        VectorOutcome::Local { results, reason } => {
            println!("{} {}", "Local fallback:".yellow().bold(), reason.dimmed());
            for (rank, m) in results.matches.iter().enumerate() {
                println!("{:>3}. {}  {}  {}", rank + 1, m.distance, m.filename, m.group.cyan());
            }
            if results.matches.is_empty() {
                println!("{}", "No similar products found.".yellow());
            }
        }
    }

    Ok(())
}
