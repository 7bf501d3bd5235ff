//! Cartwheel Core - Shared cart and catalog types.
//!
//! This crate provides the types every Cartwheel component works with:
//! - `storefront` - Cart state manager and backend client
//! - `cli` - Command-line driver for the storefront state
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart arithmetic - no I/O, no
//! HTTP clients, no async. This keeps it lightweight and allows it to be used
//! anywhere, including in tests that never touch the network.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, size labels and prices
//! - [`product`] - Products and the catalog
//! - [`cart`] - The cart mapping and its totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod product;
pub mod types;

pub use cart::{CartError, CartItems, CartLine};
pub use product::{Catalog, Product};
pub use types::*;
