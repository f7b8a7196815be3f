//! Catalog Models

use serde::{Deserialize, Serialize};

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// A product as served by the catalog.
///
/// Cart items embed a reduced copy of this record, so everything beyond
/// id, name and price is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Admin create/update body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: u32,
    pub category: String,
    pub image: String,
    pub is_active: bool,
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Filters applied locally to the fetched product list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilters {
    pub category: String,
    pub price_range: PriceRange,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_string(),
            price_range: PriceRange::default(),
        }
    }
}

impl ProductFilters {
    pub fn matches(&self, product: &Product) -> bool {
        (self.category == ALL_CATEGORIES || product.category == self.category)
            && self.price_range.contains(product.price)
    }
}
