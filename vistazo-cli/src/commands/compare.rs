//! Compare command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use vistazo_core::{
    DominantColorStrategy, ImageSignature, Scorer, ScoringConfig, ScoringPreset,
    SignatureExtractor,
};

use crate::utils;

fn signature(extractor: &SignatureExtractor, path: &Path) -> Result<ImageSignature> {
    let bytes = utils::read_image(path)?;
    extractor
        .signature_from_bytes(&path.display().to_string(), &bytes)
        .with_context(|| format!("Failed to hash {}", path.display()))
}

/// Execute the compare command.
pub fn execute(
    query: PathBuf,
    candidate: PathBuf,
    preset: ScoringPreset,
    strategy: DominantColorStrategy,
) -> Result<()> {
    let extractor = SignatureExtractor::new(strategy);
    let query_sig = signature(&extractor, &query)?;
    let candidate_sig = signature(&extractor, &candidate)?;

    let scorer = Scorer::new(ScoringConfig::preset(preset));
    let scored = scorer.score(&query_sig, &candidate_sig);
    let accepted = scorer.accepts(&scored);

    println!();
    println!("{} {}", "Query:".dimmed(), query.display());
    println!("{} {}", "Candidate:".dimmed(), candidate.display());
    println!();
    println!("   {} {}", "pHash distance:".dimmed(), scored.phash_distance);
    println!("   {} {}", "aHash distance:".dimmed(), scored.ahash_distance);
    println!(
        "   {} {}",
        "Color distance:".dimmed(),
        utils::or_dash(scored.color_distance.map(|d| format!("{d:.1}")))
    );
    if let (Some(q), Some(c)) = (scored.query_tone, scored.candidate_tone) {
        println!("   {} {:?} vs {:?}", "Tones:".dimmed(), q, c);
    }
    if scored.hue_mismatch {
        println!("   {} {}", "Hue gate:".dimmed(), "mismatch".yellow());
    }
    println!(
        "   {} {} (threshold {}, preset {})",
        "Combined score:".dimmed(),
        scored.combined_score.to_string().bold(),
        scorer.config().threshold,
        preset
    );
    println!();

    if accepted {
        println!("{}", "SIMILAR".green().bold());
    } else {
        println!("{}", "NOT SIMILAR".red().bold());
    }

    Ok(())
}
