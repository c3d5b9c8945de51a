//! Common utility functions shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vistazo_core::{Catalog, Index, Rgb};

/// Log to stderr at `warn` (or `debug` with `--verbose`) unless `RUST_LOG`
/// says otherwise.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read an image file into memory.
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read image");
    Ok(bytes)
}

/// Load an index snapshot for querying.
pub fn load_index(path: &Path) -> Result<Arc<Index>> {
    let index = Index::load(path)
        .with_context(|| format!("Failed to load index: {}", path.display()))?;
    Ok(Arc::new(index))
}

pub fn load_catalog(path: &Path) -> Result<Arc<Catalog>> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("Failed to load catalog: {}", path.display()))?;
    debug!(products = catalog.len(), "Loaded catalog");
    Ok(Arc::new(catalog))
}

/// Two-space swatch in the given color, followed by its hex code.
pub fn swatch(color: Rgb) -> String {
    format!(
        "{} #{}",
        "  ".on_truecolor(color.r, color.g, color.b),
        color.to_hex()
    )
}

/// Render an optional value, or a dimmed dash.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_image_reports_path() {
        let err = read_image(Path::new("/nonexistent/query.jpg")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/query.jpg"));
    }

    #[test]
    fn test_load_index_missing_is_index_error() {
        let dir = TempDir::new().unwrap();
        let err = load_index(&dir.path().join("index.json")).unwrap_err();
        assert!(err
            .chain()
            .any(|c| matches!(
                c.downcast_ref::<vistazo_core::VistazoError>(),
                Some(vistazo_core::VistazoError::IndexMissing { .. })
            )));
    }

    #[test]
    fn test_load_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"id": "p1", "name": "Red Hoodie"}]"#).unwrap();
        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.get("p1").map(|p| p.name.as_str()), Some("Red Hoodie"));
    }

    #[test]
    fn test_swatch_contains_hex() {
        colored::control::set_override(false);
        assert!(swatch(Rgb::new(255, 0, 16)).ends_with("#ff0010"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        colored::control::set_override(false);
        assert_eq!(or_dash(None::<u32>), "-");
    }
}
