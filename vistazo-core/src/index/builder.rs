//! Offline index construction from a directory tree.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::Index;
use crate::catalog::Catalog;
use crate::error::{Result, VistazoError};
use crate::signature::{ImageSignature, SignatureExtractor};

/// File extensions picked up by the builder (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Outcome of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Image files found under the root.
    pub scanned: usize,
    /// Signatures written to the index.
    pub indexed: usize,
    /// `(filename, reason)` for every file that could not be indexed.
    pub skipped: Vec<(String, String)>,
    /// Indexed entries that were assigned a catalog product id.
    pub matched: usize,
}

type ProgressFn = Arc<dyn Fn() + Send + Sync>;

/// Walks a directory tree and computes a signature for every image in it.
#[derive(Clone, Default)]
pub struct IndexBuilder {
    extractor: SignatureExtractor,
    catalog: Option<Arc<Catalog>>,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("extractor", &self.extractor)
            .field("catalog", &self.catalog.as_ref().map(|c| c.len()))
            .finish_non_exhaustive()
    }
}

impl IndexBuilder {
    pub fn new(extractor: SignatureExtractor) -> Self {
        Self {
            extractor,
            catalog: None,
            progress: None,
        }
    }

    /// Infer product ids by matching parent folder names against `catalog`.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Called once per processed file, possibly from several threads.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// List supported image files under `root`, sorted by path.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(root).map_err(|e| {
            VistazoError::Io(io::Error::new(
                e.kind(),
                format!("cannot read image root {}: {e}", root.display()),
            ))
        })?;
        if !metadata.is_dir() {
            return Err(VistazoError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("image root {} is not a directory", root.display()),
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Build an index from every supported image under `root`.
    ///
    /// Files that fail to read or decode are logged and listed in the report;
    /// only an unreadable root fails the build.
    pub fn build(&self, root: &Path) -> Result<(Index, BuildReport)> {
        let files = self.discover(root)?;
        info!(root = %root.display(), files = files.len(), "Building index");

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(String, Result<ImageSignature>)> =
            files.par_iter().map(|path| self.process(root, path)).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(String, Result<ImageSignature>)> =
            files.iter().map(|path| self.process(root, path)).collect();

        let mut report = BuildReport {
            scanned: files.len(),
            ..BuildReport::default()
        };
        let mut signatures = Vec::with_capacity(outcomes.len());
        for (filename, outcome) in outcomes {
            match outcome {
                Ok(signature) => {
                    if signature.product_id.is_some() {
                        report.matched += 1;
                    }
                    signatures.push(signature);
                }
                Err(e) => {
                    warn!(filename = %filename, error = %e, "Skipping image");
                    report.skipped.push((filename, e.to_string()));
                }
            }
        }

        signatures.sort_by(|a, b| a.filename.cmp(&b.filename));
        let index = Index::from_signatures(signatures);
        report.indexed = index.len();

        info!(
            indexed = report.indexed,
            skipped = report.skipped.len(),
            matched = report.matched,
            "Index build complete"
        );
        Ok((index, report))
    }

    fn process(&self, root: &Path, path: &Path) -> (String, Result<ImageSignature>) {
        let filename = relative_name(root, path);
        let outcome = fs::read(path)
            .map_err(VistazoError::from)
            .and_then(|bytes| self.extractor.signature_from_bytes(&filename, &bytes))
            .map(|signature| {
                let product_id = self.product_for(&filename);
                debug!(filename = %filename, product_id = ?product_id, "Indexed image");
                signature.with_product_id(product_id)
            });

        if let Some(progress) = &self.progress {
            progress();
        }
        (filename, outcome)
    }

    fn product_for(&self, filename: &str) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        let (folder_path, _) = filename.rsplit_once('/')?;
        let folder = folder_path.rsplit('/').next()?;
        catalog.match_folder(folder).map(|p| p.id.clone())
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
