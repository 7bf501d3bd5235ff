//! In-memory [`CartBackend`] for tests.
//!
//! Behaves like the real backend for the four endpoints: carts are stored
//! per token, adds and updates are applied to the stored cart, and unknown
//! tokens are rejected. Every call is recorded so tests can assert on what
//! was mirrored.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cartwheel_core::{CartItems, Product};

use crate::backend::{AddItemRequest, BackendError, CartBackend, UpdateItemRequest};
use crate::token::SessionToken;

/// Message the backend uses for an unknown or expired token.
pub const NOT_AUTHORIZED: &str = "Not Authorized Login Again";

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Add {
        token: String,
        request: AddItemRequest,
    },
    Update {
        token: String,
        request: UpdateItemRequest,
    },
    ListProducts,
    FetchCart {
        token: String,
    },
}

/// Scripted failure applied to every subsequent call.
#[derive(Debug, Clone)]
enum Failure {
    Api { status: u16, message: String },
    Rejected(String),
}

impl Failure {
    fn to_error(&self) -> BackendError {
        match self {
            Self::Api { status, message } => BackendError::Api {
                status: *status,
                message: message.clone(),
            },
            Self::Rejected(message) => BackendError::Rejected(message.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    products: Vec<Product>,
    carts: HashMap<String, CartItems>,
    calls: Vec<BackendCall>,
    failure: Option<Failure>,
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl InMemoryBackend {
    /// Backend with an empty catalog and no users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalog returned by the product list endpoint.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.lock().products = products;
        self
    }

    /// Register a user token with a stored cart.
    #[must_use]
    pub fn with_user(self, token: &str, cart: CartItems) -> Self {
        self.lock().carts.insert(token.to_string(), cart);
        self
    }

    /// Fail every following call with an HTTP status.
    pub fn fail_with_status(&self, status: u16, message: &str) {
        self.lock().failure = Some(Failure::Api {
            status,
            message: message.to_string(),
        });
    }

    /// Answer every following call with `success: false`.
    pub fn reject_with(&self, message: &str) {
        self.lock().failure = Some(Failure::Rejected(message.to_string()));
    }

    /// Stop failing.
    pub fn recover(&self) {
        self.lock().failure = None;
    }

    /// The cart stored for `token`, if the user exists.
    #[must_use]
    pub fn stored_cart(&self, token: &str) -> Option<CartItems> {
        self.lock().carts.get(token).cloned()
    }

    /// Every call made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call`, then fail if a failure is scripted.
    fn begin(&self, call: BackendCall) -> Result<MutexGuard<'_, Inner>, BackendError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if let Some(failure) = &inner.failure {
            return Err(failure.to_error());
        }
        Ok(inner)
    }
}

fn user_cart<'a>(
    inner: &'a mut Inner,
    token: &SessionToken,
) -> Result<&'a mut CartItems, BackendError> {
    inner
        .carts
        .get_mut(token.expose())
        .ok_or_else(|| BackendError::Rejected(NOT_AUTHORIZED.to_string()))
}

#[async_trait]
impl CartBackend for InMemoryBackend {
    async fn add_item(
        &self,
        token: &SessionToken,
        request: &AddItemRequest,
    ) -> Result<(), BackendError> {
        let mut inner = self.begin(BackendCall::Add {
            token: token.expose().to_string(),
            request: request.clone(),
        })?;
        user_cart(&mut inner, token)?.increment(&request.item_id, &request.size);
        Ok(())
    }

    async fn update_item(
        &self,
        token: &SessionToken,
        request: &UpdateItemRequest,
    ) -> Result<(), BackendError> {
        let mut inner = self.begin(BackendCall::Update {
            token: token.expose().to_string(),
            request: request.clone(),
        })?;
        let cart = user_cart(&mut inner, token)?;
        // The backend writes the quantity whether or not the entry existed
        if cart
            .set_quantity(&request.item_id, &request.size, request.quantity)
            .is_err()
        {
            cart.increment(&request.item_id, &request.size);
            let _ = cart.set_quantity(&request.item_id, &request.size, request.quantity);
        }
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let inner = self.begin(BackendCall::ListProducts)?;
        Ok(inner.products.clone())
    }

    async fn fetch_cart(&self, token: &SessionToken) -> Result<CartItems, BackendError> {
        let mut inner = self.begin(BackendCall::FetchCart {
            token: token.expose().to_string(),
        })?;
        user_cart(&mut inner, token).cloned()
    }
}
