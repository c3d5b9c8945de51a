//! The flat signature index and its JSON snapshot.
//!
//! An index is built offline, written once, and loaded read-only by every
//! query path. It is never mutated in place; a rebuild replaces the snapshot
//! file wholesale.

mod builder;

pub use builder::{BuildReport, IndexBuilder, SUPPORTED_EXTENSIONS};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, VistazoError};
use crate::signature::ImageSignature;

/// Ordered, immutable collection of image signatures keyed by filename.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    entries: Vec<ImageSignature>,
}

impl Index {
    /// Build an index, collapsing duplicate filenames.
    ///
    /// The later record for a filename wins but keeps the position of the
    /// first occurrence.
    pub fn from_signatures(signatures: Vec<ImageSignature>) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(signatures.len());
        let mut entries: Vec<ImageSignature> = Vec::with_capacity(signatures.len());

        for signature in signatures {
            match positions.get(&signature.filename) {
                Some(&i) => {
                    warn!(filename = %signature.filename, "Duplicate filename in index, keeping the later record");
                    entries[i] = signature;
                }
                None => {
                    positions.insert(signature.filename.clone(), entries.len());
                    entries.push(signature);
                }
            }
        }

        Self { entries }
    }

    /// Parse a snapshot (JSON array of signatures).
    pub fn from_json(json: &str) -> Result<Self> {
        let signatures: Vec<ImageSignature> =
            serde_json::from_str(json).map_err(|e| VistazoError::InvalidIndex(e.to_string()))?;
        Ok(Self::from_signatures(signatures))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| VistazoError::SerializationError(e.to_string()))
    }

    /// Load a snapshot from disk.
    ///
    /// A missing file is reported as [`VistazoError::IndexMissing`] so callers
    /// can tell the operator to rebuild.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VistazoError::IndexMissing {
                path: path.to_path_buf(),
            });
        }

        let json = fs::read_to_string(path)?;
        let index = Self::from_json(&json)?;
        info!(path = %path.display(), entries = index.len(), "Loaded index snapshot");
        Ok(index)
    }

    /// Write the snapshot atomically: a sibling temp file, then rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        fs::write(&tmp, self.to_json()?)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), entries = self.len(), "Saved index snapshot");
        Ok(())
    }

    pub fn get(&self, filename: &str) -> Option<&ImageSignature> {
        self.entries.iter().find(|s| s.filename == filename)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageSignature> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ImageSignature] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a ImageSignature;
    type IntoIter = std::slice::Iter<'a, ImageSignature>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "index.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
