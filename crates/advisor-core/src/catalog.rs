use serde::{Deserialize, Serialize};

use crate::selection::SelectionState;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            brand: String::new(),
            category: category.into(),
            description: description.into(),
            image: None,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.brand, &self.description]
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
    }
}

/// The product list the presentation layer renders and selects from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a `{"products": [...]}` document. Duplicate ids are rejected.
    pub fn from_json(s: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(s).map_err(|e| Error::Catalog(e.to_string()))?;
        let mut seen = std::collections::BTreeSet::new();
        for p in &catalog.products {
            if !seen.insert(p.id) {
                return Err(Error::Catalog(format!("duplicate product id {}", p.id)));
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Selected products in selection order; unknown ids are skipped.
    pub fn resolve(&self, selection: &SelectionState) -> Vec<&Product> {
        selection.ids().iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Category match is exact; the search term is a case-insensitive substring of name, brand
    /// or description. `None`/blank means "no filter".
    pub fn filter(&self, category: Option<&str>, search: Option<&str>) -> Vec<&Product> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| needle.as_deref().map_or(true, |n| p.matches(n)))
            .collect()
    }

    /// Curated products for a face area, looked up by name. Names the catalog lacks are
    /// skipped; an unknown area yields nothing.
    pub fn recommended_for_area(&self, area: &str) -> Vec<&Product> {
        crate::area::recommended_names(area)
            .iter()
            .filter_map(|name| self.products.iter().find(|p| p.name == *name))
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for p in &self.products {
            if !p.category.is_empty() && !out.contains(&p.category.as_str()) {
                out.push(&p.category);
            }
        }
        out
    }
}
