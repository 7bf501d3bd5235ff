//! Shop backend API.
//!
//! # Endpoints
//!
//! | Method | Path | Auth | Purpose |
//! |--------|------|------|---------|
//! | `POST` | `/api/cart/add` | `token` header | Mirror a one-unit increment |
//! | `POST` | `/api/cart/update` | `token` header | Mirror a quantity overwrite |
//! | `GET` | `/api/product/list` | none | Full product catalog |
//! | `POST` | `/api/cart/get` | `token` header | The user's stored cart |
//!
//! Every response carries a `success` flag; `success: false` comes with a
//! `message` and is reported as [`BackendError::Rejected`].
//!
//! The backend owns cart persistence, pricing and inventory. This module only
//! moves JSON back and forth.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use cartwheel_core::{CartItems, Product, ProductId, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::SessionToken;

/// Errors that can occur when talking to the shop backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status code.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),
}

/// Body of `POST /api/cart/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub item_id: ProductId,
    pub size: Size,
}

/// Body of `POST /api/cart/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub item_id: ProductId,
    pub size: Size,
    pub quantity: u32,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    #[serde(default)]
    pub cart_data: Option<CartItems>,
}

impl Envelope {
    /// Turn `success: false` into [`BackendError::Rejected`].
    pub(crate) fn into_success(self) -> Result<Self, BackendError> {
        if self.success {
            Ok(self)
        } else {
            Err(BackendError::Rejected(
                self.message
                    .unwrap_or_else(|| "Request was rejected".to_string()),
            ))
        }
    }
}

/// Operations the cart state needs from the backend.
///
/// [`HttpBackend`] is the real implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Record a one-unit increment for the authenticated user.
    async fn add_item(
        &self,
        token: &SessionToken,
        request: &AddItemRequest,
    ) -> Result<(), BackendError>;

    /// Overwrite a quantity for the authenticated user.
    async fn update_item(
        &self,
        token: &SessionToken,
        request: &UpdateItemRequest,
    ) -> Result<(), BackendError>;

    /// Fetch the full product catalog.
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;

    /// Fetch the authenticated user's cart.
    async fn fetch_cart(&self, token: &SessionToken) -> Result<CartItems, BackendError>;
}
