//! Hash command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use vistazo_core::scoring::classify_tone;
use vistazo_core::{rgb_to_hsl, DominantColorStrategy, SignatureExtractor};

use crate::utils;

/// Execute the hash command.
pub fn execute(image: PathBuf, as_json: bool, strategy: DominantColorStrategy) -> Result<()> {
    let bytes = utils::read_image(&image)?;
    let filename = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.display().to_string());

    let signature = SignatureExtractor::new(strategy)
        .signature_from_bytes(&filename, &bytes)
        .with_context(|| format!("Failed to hash {}", image.display()))?;

    let color = signature.color.map(|rgb| (rgb, rgb_to_hsl(rgb)));
    let tone = color.map(|(rgb, hsl)| classify_tone(rgb, hsl));

    if as_json {
        let out = json!({
            "signature": signature,
            "strategy": strategy.name(),
            "hsl": color.map(|(_, hsl)| hsl),
            "tone": tone,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{} {}", "Signature:".bold(), image.display());
    println!("   {} {}", "pHash:".dimmed(), signature.phash);
    println!("   {} {}", "aHash:".dimmed(), utils::or_dash(signature.ahash));
    match color {
        Some((rgb, hsl)) => {
            println!("   {} {}", "Color:".dimmed(), utils::swatch(rgb));
            println!(
                "   {} h {:.0}°  s {:.0}%  l {:.0}%",
                "HSL:".dimmed(),
                hsl.h,
                hsl.s,
                hsl.l
            );
        }
        None => println!("   {} {}", "Color:".dimmed(), utils::or_dash(None::<String>)),
    }
    if let Some(tone) = tone {
        println!("   {} {:?}", "Tone:".dimmed(), tone);
    }
    println!("   {} {}", "Strategy:".dimmed(), strategy.name());

    Ok(())
}
