use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VistazoError {
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Index snapshot not found at {}; rebuild the index", path.display())]
    IndexMissing { path: PathBuf },

    #[error("Invalid index snapshot: {0}")]
    InvalidIndex(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unrecognized embedding shape: {0}")]
    EmbeddingShape(String),

    #[error("Invalid feature vector: expected {expected} dimensions, got {actual}")]
    InvalidFeatureVector { expected: usize, actual: usize },

    #[error("Vector search error: {0}")]
    VectorSearchError(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl VistazoError {
    /// Whether this error came from the optional external vector search path.
    pub fn is_network(&self) -> bool {
        match self {
            Self::VectorSearchError(_) | Self::Timeout(_) => true,
            #[cfg(feature = "network")]
            Self::HttpError(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VistazoError>;
