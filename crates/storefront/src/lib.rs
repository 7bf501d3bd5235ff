//! Cartwheel Storefront library.
//!
//! Client-side cart and catalog state for the shop. Cart edits apply locally
//! and are mirrored to the shop backend whenever a session token is present.
//!
//! # Modules
//!
//! - [`state`] - [`ShopState`], the shared cart/catalog/session state
//! - [`backend`] - Backend REST client and the [`CartBackend`] trait
//! - [`config`] - Environment-based configuration
//! - [`token`] - Session token and where it is persisted
//! - [`notify`] - User-facing notices
//! - [`error`] - Error types and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod token;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{BackendError, CartBackend, HttpBackend};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{Result, ShopError};
pub use notify::{Notice, NoticeLevel};
pub use state::{CartEntry, CartTotals, ShopState};
pub use token::{FileTokenStore, MemoryTokenStore, SessionToken, TokenStore};
