//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as plain JSON numbers (`"price": 20`), so
//! [`Price`] (de)serializes through `rust_decimal::serde::float` while all
//! arithmetic stays in [`Decimal`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit price in the store's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }

    /// Format for display with the given currency symbol (e.g., `"$19.99"`).
    #[must_use]
    pub fn display(&self, symbol: &str) -> String {
        format_amount(self.0, symbol)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i32> for Price {
    fn from(amount: i32) -> Self {
        Self(Decimal::from(amount))
    }
}

/// Format a monetary amount with a currency symbol and two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal, symbol: &str) -> String {
    format!("{symbol}{:.2}", amount.round_dp(2))
}
