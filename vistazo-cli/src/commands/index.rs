//! Index command implementation.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use vistazo_core::{DominantColorStrategy, IndexBuilder, SignatureExtractor};

use crate::utils;

/// Execute the index command.
pub fn execute(
    root: PathBuf,
    output: PathBuf,
    catalog: Option<PathBuf>,
    strategy: DominantColorStrategy,
) -> Result<()> {
    let started = Instant::now();
    let mut builder = IndexBuilder::new(SignatureExtractor::new(strategy));
    if let Some(path) = &catalog {
        builder = builder.with_catalog(utils::load_catalog(path)?);
    }

    let files = builder.discover(&root)?;
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.set_message("Hashing images…");
    bar.enable_steady_tick(Duration::from_millis(100));

    let tick = bar.clone();
    let (index, report) = builder.with_progress(move || tick.inc(1)).build(&root)?;
    bar.finish_and_clear();

    index
        .save(&output)
        .with_context(|| format!("Failed to write index: {}", output.display()))?;

    info!(
        path = %output.display(),
        entries = index.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Wrote index snapshot"
    );

    println!();
    println!("{} {}", "Index written:".green().bold(), output.display());
    println!("   {} {}", "Root:".dimmed(), root.display());
    println!("   {} {}", "Strategy:".dimmed(), strategy.name());
    println!("   {} {}", "Scanned:".dimmed(), report.scanned);
    println!("   {} {}", "Indexed:".dimmed(), report.indexed);
    if catalog.is_some() {
        println!("   {} {}", "Matched to products:".dimmed(), report.matched);
    }
    if !report.skipped.is_empty() {
        println!(
            "   {} {}",
            "Skipped:".dimmed(),
            report.skipped.len().to_string().yellow()
        );
        for (filename, reason) in &report.skipped {
            println!("     {} {}", filename.yellow(), reason.dimmed());
        }
    }
    println!(
        "   {} {:.2}s",
        "Elapsed:".dimmed(),
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
