//! Read-only product catalog.
//!
//! Loaded once and shared. The builder uses it to infer product ids from
//! folder names; the server uses it to attach product names to results.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, VistazoError};

/// One catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

/// Ordered product list with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut by_id = HashMap::with_capacity(products.len());
        for (i, product) in products.iter().enumerate() {
            if by_id.insert(product.id.clone(), i).is_some() {
                warn!(id = %product.id, "Duplicate product id in catalog, keeping the later entry");
            }
        }
        Self { products, by_id }
    }

    /// Parse a JSON array of `{id, name}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(json)
            .map_err(|e| VistazoError::SerializationError(format!("catalog: {e}")))?;
        Ok(Self::from_products(products))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        debug!(path = %path.display(), products = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.by_id.get(id).map(|&i| &self.products[i])
    }

    /// First product, in catalog order, whose name contains the folder name
    /// or is contained in it. Case-insensitive.
    pub fn match_folder(&self, folder: &str) -> Option<&Product> {
        let folder = folder.trim().to_lowercase();
        if folder.is_empty() {
            return None;
        }
        self.products.iter().find(|product| {
            let name = product.name.trim().to_lowercase();
            !name.is_empty() && (name.contains(&folder) || folder.contains(&name))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
