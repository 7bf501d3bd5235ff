//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory backend, no network
//! cargo test -p cartwheel-integration-tests
//!
//! # Against a running shop backend
//! SHOP_BACKEND_URL=http://localhost:4000 SHOP_TEST_TOKEN=<jwt> \
//!     cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Local cart arithmetic through `ShopState`
//! - `cart_sync` - Mirroring cart changes to the backend
//! - `session` - Token persistence and bootstrap
//! - `live_backend` - Real HTTP backend (ignored by default)

use std::sync::Arc;

use cartwheel_core::Product;
use cartwheel_storefront::testing::InMemoryBackend;
use cartwheel_storefront::{ShopState, StorefrontConfig, TokenStore};
use url::Url;

/// Base URL used when no real backend is involved.
pub const TEST_BACKEND_URL: &str = "http://localhost:4000";

/// Configuration with every optional value defaulted.
///
/// # Panics
///
/// Never; [`TEST_BACKEND_URL`] is a valid URL.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig::new(Url::parse(TEST_BACKEND_URL).expect("TEST_BACKEND_URL is a valid URL"))
}

/// A small catalog: two shirts and a jacket.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            name: "Cotton Shirt".to_string(),
            sizes: vec!["S".into(), "M".into(), "L".into()],
            bestseller: true,
            date: 1_716_634_345_448,
            ..Product::new("shirt1", 20)
        },
        Product {
            name: "Linen Shirt".to_string(),
            sizes: vec!["M".into(), "L".into()],
            date: 1_716_634_345_449,
            ..Product::new("shirt2", 35)
        },
        Product {
            name: "Denim Jacket".to_string(),
            sizes: vec!["M".into(), "XL".into()],
            bestseller: true,
            date: 1_716_634_345_450,
            ..Product::new("jacket1", 80)
        },
    ]
}

/// State wired to `backend` and `tokens`.
#[must_use]
pub fn shop_with(backend: &Arc<InMemoryBackend>, tokens: Arc<dyn TokenStore>) -> ShopState {
    ShopState::new(test_config(), backend.clone(), tokens)
}
