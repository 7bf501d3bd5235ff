//! Unified error handling with Sentry integration.
//!
//! [`ShopError`] is what [`crate::state::ShopState`] operations return. Each
//! variant also knows the short message shown to the shopper.

use cartwheel_core::{CartError, SizeError};
use thiserror::Error;

use crate::backend::BackendError;
use crate::token::TokenStoreError;

/// Message shown when add-to-cart is attempted without picking a size.
pub const SELECT_SIZE_MESSAGE: &str = "Select Product Size.";

/// Error type for storefront state operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Add-to-cart without a selected size.
    #[error("No size selected")]
    SizeNotSelected,

    /// Cart lookup failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A backend mirror had to be spawned outside a Tokio runtime.
    #[error("No async runtime available for cart sync")]
    NoRuntime,

    /// Token store could not be read or written.
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl From<SizeError> for ShopError {
    fn from(_: SizeError) -> Self {
        Self::SizeNotSelected
    }
}

impl ShopError {
    /// Message suitable for a user-facing notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SizeNotSelected => SELECT_SIZE_MESSAGE.to_string(),
            Self::Cart(CartError::EntryNotFound { .. }) => {
                "That item is no longer in your cart.".to_string()
            }
            Self::Cart(CartError::ProductNotInCatalog(_)) => {
                "Some cart items are not available right now.".to_string()
            }
            Self::Backend(err) => backend_user_message(err),
            Self::NoRuntime => "Your cart could not be synced right now.".to_string(),
            Self::TokenStore(_) => "Could not access your saved session.".to_string(),
        }
    }
}

/// Message shown for a failed backend call.
pub(crate) fn backend_user_message(error: &BackendError) -> String {
    match error {
        // The backend's own message is meant for shoppers
        BackendError::Rejected(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Result type alias for `ShopError`.
pub type Result<T> = std::result::Result<T, ShopError>;

/// Report a backend failure to Sentry and the log.
///
/// A no-op for Sentry when no client has been initialized.
pub fn capture_backend_error(operation: &str, error: &BackendError) {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        operation,
        error = %error,
        sentry_event_id = %event_id,
        "Backend call failed"
    );
}

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "shirt1"), ("size", "M")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
