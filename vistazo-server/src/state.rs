//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use vistazo_core::embedding::{
    NeighborQueryConfig, VectorProviderConfig, VectorSearch, VectorSearchFactory,
};
use vistazo_core::{
    Catalog, Index, ScoringConfig, SearchEngine, SignatureExtractor, VistazoError,
};

use crate::config::Config;

/// Application state containing shared resources.
///
/// Everything here is loaded once at startup and is read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Local search engine; `None` when the index snapshot was not found
    pub engine: Option<Arc<SearchEngine>>,
    /// Where the index snapshot was expected, for error messages
    pub index_path: PathBuf,
    /// Catalog used to attach product names to results
    pub catalog: Option<Arc<Catalog>>,
    /// External vector search; `None` when not configured
    pub vector: Option<Arc<dyn VectorSearch>>,
    /// Dimension and neighbor-count limits for vector queries
    pub neighbors: NeighborQueryConfig,
    /// Deadline for one vector query before degrading
    pub vector_timeout: Duration,
    /// Maximum accepted image upload in bytes
    pub max_file_size: usize,
    /// Limit applied when a request does not set one
    pub default_limit: usize,
}

impl AppState {
    /// State around an already-built engine.
    pub fn new(engine: Option<SearchEngine>, config: &Config) -> Self {
        Self {
            engine: engine.map(Arc::new),
            index_path: config.index_path.clone(),
            catalog: None,
            vector: None,
            neighbors: NeighborQueryConfig::default(),
            vector_timeout: Duration::from_secs(config.vector_timeout_secs),
            max_file_size: config.max_file_size(),
            default_limit: config.default_limit,
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn with_vector_search(mut self, vector: Arc<dyn VectorSearch>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_neighbor_config(mut self, neighbors: NeighborQueryConfig) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Load the index, catalog and vector provider named by `config` and the
    /// environment.
    ///
    /// A missing index is not fatal: the server starts, reports itself as not
    /// ready and answers searches with 503 until it is restarted with an
    /// index. A catalog that cannot be read is fatal.
    pub fn from_config(config: &Config) -> Result<Self, VistazoError> {
        let engine = match Index::load(&config.index_path) {
            Ok(index) => Some(SearchEngine::new(
                Arc::new(index),
                ScoringConfig::preset(config.scoring_preset),
                SignatureExtractor::new(config.color_strategy),
            )),
            Err(e @ VistazoError::IndexMissing { .. }) => {
                warn!(error = %e, "Starting without a search index");
                None
            }
            Err(e) => return Err(e),
        };

        let mut state = Self::new(engine, config).with_neighbor_config(NeighborQueryConfig::from_env());

        if let Some(path) = &config.catalog_path {
            let catalog = Catalog::load(path)?;
            info!(path = %path.display(), products = catalog.len(), "Loaded catalog");
            state = state.with_catalog(catalog);
        }

        match VectorProviderConfig::from_env().and_then(VectorSearchFactory::create) {
            Ok(vector) => {
                info!(source = %vector.source(), "Vector search enabled");
                state = state.with_vector_search(vector);
            }
            Err(e) => info!(reason = %e, "Vector search disabled"),
        }

        Ok(state)
    }

    pub fn index_entries(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.index().len())
    }

    /// The engine, or the error that tells the operator to rebuild the index.
    pub fn require_engine(&self) -> Result<Arc<SearchEngine>, VistazoError> {
        self.engine
            .clone()
            .ok_or_else(|| VistazoError::IndexMissing {
                path: self.index_path.clone(),
            })
    }

    /// Product name for a result, when a catalog is loaded.
    pub fn product_name(&self, product_id: Option<&str>) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        catalog.get(product_id?).map(|p| p.name.clone())
    }
}
