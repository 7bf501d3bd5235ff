//! HTTP implementation of [`CartBackend`] using `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cartwheel_core::{CartItems, Product};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{AddItemRequest, BackendError, CartBackend, Envelope, UpdateItemRequest};
use crate::config::StorefrontConfig;
use crate::token::SessionToken;

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Header the backend reads the session token from.
const TOKEN_HEADER: &str = "token";

/// Characters of a response body kept in error logs.
const LOGGED_BODY_CHARS: usize = 500;

/// Client for the shop backend REST API.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    add_url: String,
    update_url: String,
    products_url: String,
    cart_url: String,
}

impl HttpBackend {
    /// Create a client for the backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                add_url: config.endpoint("/api/cart/add"),
                update_url: config.endpoint("/api/cart/update"),
                products_url: config.endpoint("/api/product/list"),
                cart_url: config.endpoint("/api/cart/get"),
            }),
        })
    }

    /// POST a JSON body with the session token header.
    async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        url: &str,
        token: &SessionToken,
        body: &B,
    ) -> Result<Envelope, BackendError> {
        let response = self
            .inner
            .client
            .post(url)
            .header(TOKEN_HEADER, token.expose())
            .json(body)
            .send()
            .await?;
        read_envelope(response).await
    }
}

/// Decode a response into an [`Envelope`], mapping HTTP and JSON failures.
async fn read_envelope(response: reqwest::Response) -> Result<Envelope, BackendError> {
    let status = response.status();

    // Get response body as text first for better error diagnostics
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str::<Envelope>(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e)
    })
}

#[async_trait]
impl CartBackend for HttpBackend {
    #[instrument(skip(self, token), fields(item_id = %request.item_id, size = %request.size))]
    async fn add_item(
        &self,
        token: &SessionToken,
        request: &AddItemRequest,
    ) -> Result<(), BackendError> {
        self.post(&self.inner.add_url, token, request)
            .await?
            .into_success()?;
        debug!("Cart add mirrored");
        Ok(())
    }

    #[instrument(
        skip(self, token),
        fields(item_id = %request.item_id, size = %request.size, quantity = request.quantity)
    )]
    async fn update_item(
        &self,
        token: &SessionToken,
        request: &UpdateItemRequest,
    ) -> Result<(), BackendError> {
        self.post(&self.inner.update_url, token, request)
            .await?
            .into_success()?;
        debug!("Cart update mirrored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let response = self.inner.client.get(&self.inner.products_url).send().await?;
        let envelope = read_envelope(response).await?.into_success()?;
        let products = envelope.products.unwrap_or_default();
        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &SessionToken) -> Result<CartItems, BackendError> {
        let envelope = self
            .post(&self.inner.cart_url, token, &serde_json::json!({}))
            .await?
            .into_success()?;
        Ok(envelope.cart_data.unwrap_or_default())
    }
}
