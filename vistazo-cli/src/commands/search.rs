//! Search command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use vistazo_core::{
    DominantColorStrategy, ScoringConfig, ScoringPreset, SearchEngine, SearchOptions,
    SignatureExtractor,
};

use crate::utils;

pub struct SearchArgs {
    pub image: PathBuf,
    pub index: PathBuf,
    pub preset: ScoringPreset,
    pub threshold: Option<u32>,
    pub limit: usize,
    pub catalog: Option<PathBuf>,
    pub json: bool,
    pub strategy: DominantColorStrategy,
}

/// Execute the search command.
pub fn execute(args: SearchArgs) -> Result<()> {
    let bytes = utils::read_image(&args.image)?;
    let index = utils::load_index(&args.index)?;
    let catalog = args.catalog.as_deref().map(utils::load_catalog).transpose()?;

    let engine = SearchEngine::new(
        index,
        ScoringConfig::preset(args.preset),
        SignatureExtractor::new(args.strategy),
    );
    let options = SearchOptions {
        threshold: args.threshold,
        limit: args.limit,
        preset: None,
    };
    let results = engine
        .search_bytes(&bytes, &options)
        .with_context(|| format!("Failed to search with {}", args.image.display()))?;

    let product_name = |id: Option<&str>| {
        id.and_then(|id| catalog.as_ref()?.get(id))
            .map(|p| p.name.clone())
    };

    if args.json {
        let matches: Vec<_> = results
            .matches
            .iter()
            .map(|m| -> serde_json::Result<serde_json::Value> {
                let mut value = serde_json::to_value(m)?;
                if let Some(name) = product_name(m.product_id.as_deref()) {
                    value["productName"] = json!(name);
                }
                Ok(value)
            })
            .collect::<serde_json::Result<_>>()?;
        let out = json!({
            "preset": results.preset,
            "threshold": results.threshold,
            "evaluated": results.evaluated,
            "accepted": results.accepted,
            "query": results.query,
            "results": matches,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {} {}",
        "Query:".bold(),
        args.image.display(),
        format!(
            "(phash {}, preset {}, threshold {})",
            results.query.phash, results.preset, results.threshold
        )
        .dimmed()
    );
    if let Some(color) = results.query.color {
        println!("   {} {}", "Color:".dimmed(), utils::swatch(color));
    }
    println!(
        "   {} {} of {} candidates accepted",
        "Scored:".dimmed(),
        results.accepted,
        results.evaluated
    );
    println!();

    if results.matches.is_empty() {
        println!("{}", "No similar products found.".yellow());
        return Ok(());
    }

    for (rank, m) in results.matches.iter().enumerate() {
        let label = match product_name(m.product_id.as_deref()) {
            Some(name) => format!("{} ({})", name, m.group),
            None => m.group.clone(),
        };
        let distance = if m.distance == 0 {
            m.distance.to_string().green().bold()
        } else {
            m.distance.to_string().normal()
        };
        println!(
            "{:>3}. {} {}  {}",
            rank + 1,
            distance,
            m.filename,
            label.cyan()
        );
        println!(
            "     {} phash {}  ahash {}  color {}",
            "·".dimmed(),
            m.phash_distance,
            m.ahash_distance,
            utils::or_dash(m.color_distance.map(|d| format!("{d:.1}")))
        );
    }

    Ok(())
}
