//! The shopping cart mapping and the totals derived from it.
//!
//! A cart maps product ID → size label → quantity. A missing key means a
//! quantity of zero. Entries may hold an explicit zero after a quantity update;
//! those entries are ignored by every total.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::product::Catalog;
use crate::types::{ProductId, Size};

/// Errors from cart lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity update for a product/size pair that is not in the cart.
    #[error("No cart entry for product {product_id} in size {size}")]
    EntryNotFound {
        /// Product that was looked up.
        product_id: ProductId,
        /// Size that was looked up.
        size: Size,
    },

    /// A cart product has no price because the catalog does not list it.
    #[error("Product {0} is not in the catalog")]
    ProductNotInCatalog(ProductId),
}

/// Shopping cart contents.
///
/// Serializes as the nested object the backend uses for `cartData`:
/// `{"shirt1": {"M": 2}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItems(BTreeMap<ProductId, BTreeMap<Size, u32>>);

/// One non-empty row of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product in the cart.
    pub product_id: ProductId,
    /// Selected size.
    pub size: Size,
    /// Quantity, always greater than zero.
    pub quantity: u32,
}

impl CartItems {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity recorded for a product/size pair (zero when absent).
    #[must_use]
    pub fn quantity(&self, product_id: &str, size: &str) -> u32 {
        self.0
            .get(product_id)
            .and_then(|sizes| sizes.get(size))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the product/size pair has an entry, even one holding zero.
    #[must_use]
    pub fn contains(&self, product_id: &str, size: &str) -> bool {
        self.0
            .get(product_id)
            .is_some_and(|sizes| sizes.contains_key(size))
    }

    /// Whether the cart holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add one unit of a product in a size, creating entries as needed.
    ///
    /// Returns the new quantity.
    pub fn increment(&mut self, product_id: &ProductId, size: &Size) -> u32 {
        let quantity = self
            .0
            .entry(product_id.clone())
            .or_default()
            .entry(size.clone())
            .or_insert(0);
        *quantity = quantity.saturating_add(1);
        *quantity
    }

    /// Overwrite the quantity of an existing product/size pair.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EntryNotFound`] if the pair is not in the cart.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        size: &Size,
        quantity: u32,
    ) -> Result<(), CartError> {
        let slot = self
            .0
            .get_mut(product_id.as_str())
            .and_then(|sizes| sizes.get_mut(size.as_str()))
            .ok_or_else(|| CartError::EntryNotFound {
                product_id: product_id.clone(),
                size: size.clone(),
            })?;
        *slot = quantity;
        Ok(())
    }

    /// Total number of units across every product and size.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.0
            .values()
            .flat_map(BTreeMap::values)
            .filter(|&&quantity| quantity > 0)
            .map(|&quantity| u64::from(quantity))
            .sum()
    }

    /// Total value of the cart priced against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ProductNotInCatalog`] for the first product with a
    /// positive quantity that the catalog does not list.
    pub fn amount(&self, catalog: &Catalog) -> Result<Decimal, CartError> {
        let mut total = Decimal::ZERO;
        for (product_id, sizes) in &self.0 {
            for &quantity in sizes.values().filter(|&&q| q > 0) {
                let product = catalog
                    .find(product_id.as_str())
                    .ok_or_else(|| CartError::ProductNotInCatalog(product_id.clone()))?;
                total += product.price.times(quantity);
            }
        }
        Ok(total)
    }

    /// Rows with a positive quantity, ordered by product then size.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.0
            .iter()
            .flat_map(|(product_id, sizes)| {
                sizes
                    .iter()
                    .filter(|&(_, &quantity)| quantity > 0)
                    .map(move |(size, &quantity)| CartLine {
                        product_id: product_id.clone(),
                        size: size.clone(),
                        quantity,
                    })
            })
            .collect()
    }
}
