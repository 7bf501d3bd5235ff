//! Products and the product catalog.
//!
//! The catalog is an ordered list replaced wholesale whenever the backend is
//! queried. Lookups are linear; catalogs are small and the order is the one
//! the backend chose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product as listed by the backend.
///
/// Only `_id` and `price` take part in cart arithmetic; everything else is
/// display metadata and defaults when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend document ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Unit price.
    pub price: Price,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Image URLs, first one is the primary image.
    #[serde(default, rename = "image")]
    pub images: Vec<String>,
    /// Top-level category (e.g., "Men").
    #[serde(default)]
    pub category: String,
    /// Sub-category (e.g., "Topwear").
    #[serde(default)]
    pub sub_category: String,
    /// Size labels the product is sold in.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Whether the product is featured as a bestseller.
    #[serde(default)]
    pub bestseller: bool,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub date: i64,
}

impl Product {
    /// Create a product with only the fields cart arithmetic needs.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, price: impl Into<Price>) -> Self {
        Self {
            id: id.into(),
            price: price.into(),
            name: String::new(),
            description: String::new(),
            images: Vec::new(),
            category: String::new(),
            sub_category: String::new(),
            sizes: Vec::new(),
            bestseller: false,
            date: 0,
        }
    }

    /// Creation time as a timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.date)
    }

    /// Whether `size` is one of the product's offered sizes.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }
}

/// Ordered product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(Vec<Product>);

impl Catalog {
    /// Create a catalog from a product list, preserving order.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self(products)
    }

    /// All products in backend order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.0
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the catalog has no products (e.g., not loaded yet).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find a product by ID.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.0.iter().find(|p| p.id.as_str() == id)
    }

    /// Up to `limit` products flagged as bestsellers, in catalog order.
    #[must_use]
    pub fn bestsellers(&self, limit: usize) -> Vec<&Product> {
        self.0.iter().filter(|p| p.bestseller).take(limit).collect()
    }

    /// Up to `limit` most recently created products, newest first.
    #[must_use]
    pub fn latest(&self, limit: usize) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.0.iter().collect();
        products.sort_by(|a, b| b.date.cmp(&a.date));
        products.truncate(limit);
        products
    }

    /// Products whose name contains `term`, ignoring case.
    ///
    /// A blank term matches every product.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.0.iter().collect();
        }
        self.0
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self(products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn named(id: &str, name: &str, date: i64, bestseller: bool) -> Product {
        Product {
            name: name.to_string(),
            date,
            bestseller,
            ..Product::new(id, 10)
        }
    }

    #[test]
    fn test_product_deserializes_backend_shape() {
        let json = r#"{
            "_id": "shirt1",
            "name": "Cotton Shirt",
            "description": "A shirt",
            "price": 20,
            "image": ["https://cdn.example/a.png"],
            "category": "Men",
            "subCategory": "Topwear",
            "sizes": ["S", "M"],
            "bestseller": true,
            "date": 1716634345448
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "shirt1");
        assert_eq!(product.price, Price::from(20));
        assert_eq!(product.sub_category, "Topwear");
        assert_eq!(product.images, vec!["https://cdn.example/a.png".to_string()]);
        assert!(product.offers_size("M"));
        assert!(!product.offers_size("XL"));
        assert!(product.created_at().is_some());
    }

    #[test]
    fn test_product_minimal_shape() {
        let product: Product = serde_json::from_str(r#"{"_id":"p","price":5.5}"#).unwrap();
        assert!(product.name.is_empty());
        assert!(product.sizes.is_empty());
        assert!(!product.bestseller);
    }

    #[test]
    fn test_find() {
        let catalog = Catalog::new(vec![Product::new("a", 1), Product::new("b", 2)]);
        assert_eq!(catalog.find("b").map(|p| p.price), Some(Price::from(2)));
        assert!(catalog.find("c").is_none());
    }

    #[test]
    fn test_bestsellers_respects_limit_and_order() {
        let catalog = Catalog::new(vec![
            named("a", "A", 1, true),
            named("b", "B", 2, false),
            named("c", "C", 3, true),
            named("d", "D", 4, true),
        ]);
        let ids: Vec<&str> = catalog.bestsellers(2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_latest_newest_first() {
        let catalog = Catalog::new(vec![
            named("old", "Old", 1, false),
            named("new", "New", 30, false),
            named("mid", "Mid", 20, false),
        ]);
        let ids: Vec<&str> = catalog.latest(2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let catalog = Catalog::new(vec![
            named("a", "Cotton Shirt", 1, false),
            named("b", "Denim Jacket", 2, false),
        ]);
        let hits = catalog.search("SHIRT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "a");
        assert_eq!(catalog.search("  ").len(), 2);
    }
}
