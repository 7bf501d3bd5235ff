//! Shared storefront state: the cart, the catalog and the session.
//!
//! [`ShopState`] is built once at startup and cloned into every consumer
//! that needs cart or catalog access. Clones share the same state.
//!
//! # Synchronization
//!
//! Cart mutations apply locally first and are then mirrored to the backend
//! when a session token is present. Mirroring is best effort: failures are
//! logged and surfaced as notices, never retried and never rolled back.
//!
//! # Observing changes
//!
//! The cart and catalog live in `tokio::sync::watch` channels. Each mutation
//! publishes a complete new value, so subscribers never see a half-applied
//! change.

use std::sync::{Arc, PoisonError, RwLock};

use cartwheel_core::types::price::format_amount;
use cartwheel_core::{CartItems, CartLine, Catalog, Product, ProductId, Size};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, instrument, warn};
use url::Url;

use crate::backend::{
    AddItemRequest, BackendError, CartBackend, HttpBackend, UpdateItemRequest,
};
use crate::config::StorefrontConfig;
use crate::error::{
    Result, SELECT_SIZE_MESSAGE, ShopError, add_breadcrumb, backend_user_message,
    capture_backend_error,
};
use crate::notify::{Notice, Notifier};
use crate::token::{FileTokenStore, SessionToken, TokenStore};

/// A cart row joined with its catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    /// Product, size and quantity.
    pub line: CartLine,
    /// Catalog product, `None` while the catalog does not list it.
    pub product: Option<Product>,
}

impl CartEntry {
    /// Unit price times quantity, when the product is known.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product
            .as_ref()
            .map(|p| p.price.times(self.line.quantity))
    }
}

/// Order summary figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Search bar state shared between the header and product listings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchState {
    term: String,
    visible: bool,
}

/// Storefront state shared across consumers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ShopState {
    inner: Arc<ShopStateInner>,
}

struct ShopStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn CartBackend>,
    tokens: Arc<dyn TokenStore>,
    notifier: Notifier,
    cart: watch::Sender<CartItems>,
    catalog: watch::Sender<Catalog>,
    token: RwLock<Option<SessionToken>>,
    search: RwLock<SearchState>,
}

impl ShopState {
    /// Create state with an empty cart, an empty catalog and no session.
    ///
    /// Call [`ShopState::bootstrap`] to load the catalog and any stored
    /// session.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        backend: Arc<dyn CartBackend>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let (cart, _) = watch::channel(CartItems::new());
        let (catalog, _) = watch::channel(Catalog::default());

        Self {
            inner: Arc::new(ShopStateInner {
                config,
                backend,
                tokens,
                notifier: Notifier::new(),
                cart,
                catalog,
                token: RwLock::new(None),
                search: RwLock::new(SearchState {
                    term: String::new(),
                    visible: true,
                }),
            }),
        }
    }

    /// Create state talking HTTP to the configured backend, with the session
    /// token kept in the configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: StorefrontConfig) -> std::result::Result<Self, BackendError> {
        let backend = HttpBackend::new(&config)?;
        let tokens = FileTokenStore::new(config.token_path.clone());
        debug!(path = %tokens.path().display(), "Using file token store");
        Ok(Self::new(config, Arc::new(backend), Arc::new(tokens)))
    }

    /// Load the catalog and, if a token is stored, the user's cart.
    ///
    /// Both requests run concurrently. Network failures are notified by the
    /// individual loads and do not fail bootstrap.
    ///
    /// # Errors
    ///
    /// Returns an error only if the token store cannot be read.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<()> {
        let stored = if self.token().is_none() {
            self.inner.tokens.load()?
        } else {
            None
        };

        if let Some(token) = &stored {
            info!("Restored session from token store");
            self.write_token(Some(token.clone()));
        }

        let load_cart = async {
            if let Some(token) = &stored {
                let _ = self.load_user_cart(token).await;
            }
        };
        let (_, ()) = tokio::join!(self.load_products(), load_cart);
        Ok(())
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Add one unit of a product in a size.
    ///
    /// With a session token the increment is mirrored to the backend and the
    /// call waits for it; a failed mirror is notified but the local change
    /// stays.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::SizeNotSelected`] (and notifies) if `size` is
    /// empty. The cart is unchanged in that case.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: &ProductId, size: &str) -> Result<()> {
        let Ok(size) = Size::parse(size) else {
            self.inner.notifier.error(SELECT_SIZE_MESSAGE);
            return Err(ShopError::SizeNotSelected);
        };

        let mut quantity = 0;
        self.inner.cart.send_modify(|cart| {
            quantity = cart.increment(product_id, &size);
        });
        debug!(size = %size, quantity, "Added to cart");
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str()), ("size", size.as_str())]),
        );

        if let Some(token) = self.token() {
            let request = AddItemRequest {
                item_id: product_id.clone(),
                size,
            };
            if let Err(e) = self.inner.backend.add_item(&token, &request).await {
                self.report_backend_error("add_to_cart", &e);
            }
        }
        Ok(())
    }

    /// Overwrite the quantity of an item already in the cart.
    ///
    /// The backend mirror runs in a spawned task; its handle is returned when
    /// a session token is present so callers can wait for it. Failures inside
    /// the task are logged and notified.
    ///
    /// # Errors
    ///
    /// Nothing is changed or mirrored when this returns an error:
    ///
    /// - [`ShopError::Cart`] with [`cartwheel_core::CartError::EntryNotFound`]
    ///   if the product/size pair is not in the cart.
    /// - [`ShopError::NoRuntime`] if a session token is set but there is no
    ///   Tokio runtime to run the mirror on.
    #[instrument(skip(self), fields(product_id = %product_id, size = %size))]
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        size: &Size,
        quantity: u32,
    ) -> Result<Option<JoinHandle<()>>> {
        let sync_target = match self.token() {
            Some(token) => {
                let runtime = Handle::try_current().map_err(|_| ShopError::NoRuntime)?;
                Some((token, runtime))
            }
            None => None,
        };

        let mut outcome = Ok(());
        self.inner.cart.send_if_modified(|cart| {
            outcome = cart.set_quantity(product_id, size, quantity);
            outcome.is_ok()
        });
        outcome?;
        debug!(quantity, "Updated cart quantity");

        let Some((token, runtime)) = sync_target else {
            return Ok(None);
        };

        let state = self.clone();
        let request = UpdateItemRequest {
            item_id: product_id.clone(),
            size: size.clone(),
            quantity,
        };
        let sync = async move {
            if let Err(e) = state.inner.backend.update_item(&token, &request).await {
                state.report_backend_error("update_quantity", &e);
            }
        };
        Ok(Some(runtime.spawn(sync.instrument(tracing::Span::current()))))
    }

    /// Replace the whole cart (e.g., emptying it after an order is placed).
    ///
    /// Not mirrored to the backend.
    pub fn replace_cart(&self, cart: CartItems) {
        self.inner.cart.send_replace(cart);
    }

    /// Empty the cart locally.
    pub fn clear_cart(&self) {
        self.replace_cart(CartItems::new());
    }

    // =========================================================================
    // Cart Queries
    // =========================================================================

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart_items(&self) -> CartItems {
        self.inner.cart.borrow().clone()
    }

    /// Receiver that observes every cart replacement.
    #[must_use]
    pub fn subscribe_cart(&self) -> watch::Receiver<CartItems> {
        self.inner.cart.subscribe()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.inner.cart.borrow().count()
    }

    /// Total value of the cart at catalog prices.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Cart`] if a product in the cart is missing from
    /// the catalog (for example before the catalog has loaded).
    pub fn cart_amount(&self) -> Result<Decimal> {
        let catalog = self.inner.catalog.borrow();
        Ok(self.inner.cart.borrow().amount(&catalog)?)
    }

    /// Subtotal, delivery fee and total.
    ///
    /// An empty cart ships free.
    ///
    /// # Errors
    ///
    /// Same as [`ShopState::cart_amount`].
    pub fn cart_totals(&self) -> Result<CartTotals> {
        let subtotal = self.cart_amount()?;
        let shipping = if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            self.inner.config.delivery_fee
        };
        Ok(CartTotals {
            subtotal,
            shipping,
            total: subtotal + shipping,
        })
    }

    /// Cart rows with a positive quantity, joined with the catalog.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartEntry> {
        let lines = self.inner.cart.borrow().lines();
        let catalog = self.inner.catalog.borrow();
        lines
            .into_iter()
            .map(|line| CartEntry {
                product: catalog.find(line.product_id.as_str()).cloned(),
                line,
            })
            .collect()
    }

    // =========================================================================
    // Backend Loads
    // =========================================================================

    /// Replace the catalog with the backend's product list.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Backend`] (and notifies) if the request fails or
    /// the backend rejects it. The catalog is unchanged in that case.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> Result<()> {
        match self.inner.backend.list_products().await {
            Ok(products) => {
                info!(count = products.len(), "Catalog loaded");
                self.inner.catalog.send_replace(Catalog::new(products));
                Ok(())
            }
            Err(e) => {
                self.report_backend_error("load_products", &e);
                Err(e.into())
            }
        }
    }

    /// Replace the cart with the one the backend stores for `token`.
    ///
    /// No merge: whatever was in the local cart is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Backend`] if the request fails (notified) or the
    /// backend answers `success: false` (not notified). The cart is unchanged
    /// in both cases.
    #[instrument(skip_all)]
    pub async fn load_user_cart(&self, token: &SessionToken) -> Result<()> {
        match self.inner.backend.fetch_cart(token).await {
            Ok(cart) => {
                debug!(count = cart.count(), "User cart loaded");
                self.inner.cart.send_replace(cart);
                Ok(())
            }
            Err(BackendError::Rejected(message)) => {
                debug!(%message, "Backend declined cart fetch; keeping local cart");
                Err(BackendError::Rejected(message).into())
            }
            Err(e) => {
                self.report_backend_error("load_user_cart", &e);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Catalog Queries
    // =========================================================================

    /// Snapshot of the catalog.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.inner.catalog.borrow().clone()
    }

    /// All products in backend order.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.catalog.borrow().products().to_vec()
    }

    /// Receiver that observes every catalog replacement.
    #[must_use]
    pub fn subscribe_products(&self) -> watch::Receiver<Catalog> {
        self.inner.catalog.subscribe()
    }

    /// Look up a product by ID.
    #[must_use]
    pub fn product(&self, product_id: &str) -> Option<Product> {
        self.inner.catalog.borrow().find(product_id).cloned()
    }

    /// Up to `limit` bestsellers.
    #[must_use]
    pub fn bestsellers(&self, limit: usize) -> Vec<Product> {
        self.inner
            .catalog
            .borrow()
            .bestsellers(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Up to `limit` newest products.
    #[must_use]
    pub fn latest(&self, limit: usize) -> Vec<Product> {
        self.inner
            .catalog
            .borrow()
            .latest(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Products whose name matches `term`.
    #[must_use]
    pub fn search_products(&self, term: &str) -> Vec<Product> {
        self.inner
            .catalog
            .borrow()
            .search(term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Products filtered by the search bar when it is shown.
    #[must_use]
    pub fn visible_products(&self) -> Vec<Product> {
        let search = self.read_search();
        if search.visible {
            self.search_products(&search.term)
        } else {
            self.products()
        }
    }

    // =========================================================================
    // Search Bar
    // =========================================================================

    /// Current search term.
    #[must_use]
    pub fn search(&self) -> String {
        self.read_search().term
    }

    /// Set the search term.
    pub fn set_search(&self, term: impl Into<String>) {
        self.search_slot().term = term.into();
    }

    /// Whether the search bar is shown.
    #[must_use]
    pub fn show_search(&self) -> bool {
        self.read_search().visible
    }

    /// Show or hide the search bar.
    pub fn set_show_search(&self, visible: bool) {
        self.search_slot().visible = visible;
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Current session token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether cart changes are mirrored to the backend.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Adopt a token obtained from a login and persist it.
    ///
    /// The local cart is left as is; call [`ShopState::load_user_cart`] to
    /// switch to the user's stored cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::TokenStore`] if the token cannot be persisted.
    /// The token is not adopted in that case.
    pub fn set_token(&self, token: SessionToken) -> Result<()> {
        self.inner.tokens.save(&token)?;
        self.write_token(Some(token));
        info!("Session token set");
        self.inner.notifier.notify(Notice::success("Signed in."));
        Ok(())
    }

    /// Forget the session and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::TokenStore`] if the stored token cannot be
    /// removed. Local state is cleared regardless.
    pub fn sign_out(&self) -> Result<()> {
        self.write_token(None);
        self.clear_cart();
        self.inner.tokens.clear()?;
        info!("Signed out");
        self.inner.notifier.notify(Notice::info("Signed out."));
        Ok(())
    }

    // =========================================================================
    // Configuration & Notices
    // =========================================================================

    /// Currency symbol for display.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.inner.config.currency_symbol
    }

    /// Flat delivery fee.
    #[must_use]
    pub fn delivery_fee(&self) -> Decimal {
        self.inner.config.delivery_fee
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn backend_url(&self) -> &Url {
        &self.inner.config.backend_url
    }

    /// Format an amount with the configured currency symbol.
    #[must_use]
    pub fn format_price(&self, amount: Decimal) -> String {
        format_amount(amount, self.currency())
    }

    /// Receive user-facing notices sent from now on.
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notifier.subscribe()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn write_token(&self, token: Option<SessionToken>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn read_search(&self) -> SearchState {
        self.inner
            .search
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn search_slot(&self) -> std::sync::RwLockWriteGuard<'_, SearchState> {
        self.inner
            .search
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Log a failed backend call and tell the shopper.
    fn report_backend_error(&self, operation: &str, error: &BackendError) {
        match error {
            BackendError::Rejected(message) => {
                warn!(operation, %message, "Backend rejected request");
            }
            other => capture_backend_error(operation, other),
        }
        self.inner.notifier.error(backend_user_message(error));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::notify::NoticeLevel;
    use crate::testing::{BackendCall, InMemoryBackend};
    use crate::token::MemoryTokenStore;

    fn config() -> StorefrontConfig {
        StorefrontConfig::new(Url::parse("http://localhost:4000").unwrap())
    }

    fn state_with(backend: Arc<InMemoryBackend>) -> ShopState {
        ShopState::new(config(), backend, Arc::new(MemoryTokenStore::new()))
    }

    fn id(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn size(s: &str) -> Size {
        Size::parse(s).unwrap()
    }

    fn token(s: &str) -> SessionToken {
        SessionToken::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_to_cart_scenario() {
        let state = state_with(Arc::new(InMemoryBackend::new()));

        state.add_to_cart(&id("shirt1"), "M").await.unwrap();
        assert_eq!(state.cart_items().quantity("shirt1", "M"), 1);

        state.add_to_cart(&id("shirt1"), "M").await.unwrap();
        assert_eq!(state.cart_items().quantity("shirt1", "M"), 2);
        assert_eq!(state.cart_count(), 2);
    }

    #[tokio::test]
    async fn test_add_to_cart_without_size_is_rejected() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        let mut notices = state.subscribe_notices();
        let cart_rx = state.subscribe_cart();

        let err = state.add_to_cart(&id("shirt1"), "").await.unwrap_err();

        assert!(matches!(err, ShopError::SizeNotSelected));
        assert!(state.cart_items().is_empty());
        assert!(!cart_rx.has_changed().unwrap());
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::error("Select Product Size.")
        );
    }

    #[tokio::test]
    async fn test_add_to_cart_local_only_makes_no_calls() {
        let backend = Arc::new(InMemoryBackend::new());
        let state = state_with(backend.clone());

        state.add_to_cart(&id("p"), "S").await.unwrap();

        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_cart_mirrors_when_signed_in() {
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", CartItems::new()));
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();

        state.add_to_cart(&id("shirt1"), "M").await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Add {
                token: "jwt".to_string(),
                request: AddItemRequest {
                    item_id: id("shirt1"),
                    size: size("M"),
                },
            }]
        );
        assert_eq!(backend.stored_cart("jwt").unwrap().quantity("shirt1", "M"), 1);
    }

    #[tokio::test]
    async fn test_add_to_cart_sync_failure_keeps_local_change() {
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", CartItems::new()));
        backend.fail_with_status(500, "database down");
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();
        let mut notices = state.subscribe_notices();

        state.add_to_cart(&id("shirt1"), "M").await.unwrap();

        assert_eq!(state.cart_count(), 1);
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("database down"));
    }

    #[tokio::test]
    async fn test_cart_observers_see_each_change() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        let mut rx = state.subscribe_cart();

        state.add_to_cart(&id("a"), "M").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().count(), 1);

        state.add_to_cart(&id("a"), "M").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().quantity("a", "M"), 2);
    }

    #[tokio::test]
    async fn test_update_quantity_existing_entry() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        state.add_to_cart(&id("p"), "M").await.unwrap();

        let handle = state.update_quantity(&id("p"), &size("M"), 5).unwrap();

        assert!(handle.is_none());
        assert_eq!(state.cart_items().quantity("p", "M"), 5);
        assert_eq!(state.cart_count(), 5);
    }

    #[tokio::test]
    async fn test_update_quantity_to_zero_hides_item() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        state.add_to_cart(&id("p"), "M").await.unwrap();

        state.update_quantity(&id("p"), &size("M"), 0).unwrap();

        assert!(state.cart_items().contains("p", "M"));
        assert_eq!(state.cart_count(), 0);
        assert!(state.cart_lines().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_missing_entry() {
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", CartItems::new()));
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();
        let rx = state.subscribe_cart();

        let err = state.update_quantity(&id("ghost"), &size("M"), 3).unwrap_err();

        assert!(matches!(
            err,
            ShopError::Cart(cartwheel_core::CartError::EntryNotFound { .. })
        ));
        assert!(!rx.has_changed().unwrap());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_mirrors_in_background() {
        let mut stored = CartItems::new();
        stored.increment(&id("p"), &size("M"));
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", stored));
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();
        state.load_user_cart(&token("jwt")).await.unwrap();

        let handle = state.update_quantity(&id("p"), &size("M"), 4).unwrap();
        handle.unwrap().await.unwrap();

        assert_eq!(backend.stored_cart("jwt").unwrap().quantity("p", "M"), 4);
        assert!(backend.calls().contains(&BackendCall::Update {
            token: "jwt".to_string(),
            request: UpdateItemRequest {
                item_id: id("p"),
                size: size("M"),
                quantity: 4,
            },
        }));
    }

    #[tokio::test]
    async fn test_update_quantity_sync_failure_is_notified() {
        let mut stored = CartItems::new();
        stored.increment(&id("p"), &size("M"));
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", stored.clone()));
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();
        state.replace_cart(stored);
        backend.reject_with("Not Authorized Login Again");
        let mut notices = state.subscribe_notices();

        let handle = state.update_quantity(&id("p"), &size("M"), 2).unwrap();
        handle.unwrap().await.unwrap();

        assert_eq!(state.cart_items().quantity("p", "M"), 2);
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::error("Not Authorized Login Again")
        );
    }

    #[tokio::test]
    async fn test_cart_amount_scenario() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![Product::new("shirt1", 20)]));
        let state = state_with(backend);
        state.load_products().await.unwrap();
        state.add_to_cart(&id("shirt1"), "M").await.unwrap();
        state.add_to_cart(&id("shirt1"), "M").await.unwrap();

        assert_eq!(state.cart_amount().unwrap(), Decimal::from(40));
    }

    #[tokio::test]
    async fn test_cart_amount_product_missing_from_catalog() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        state.add_to_cart(&id("shirt1"), "M").await.unwrap();

        let err = state.cart_amount().unwrap_err();
        assert!(matches!(
            err,
            ShopError::Cart(cartwheel_core::CartError::ProductNotInCatalog(_))
        ));
    }

    #[tokio::test]
    async fn test_cart_totals() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![Product::new("shirt1", 20)]));
        let state = state_with(backend);
        state.load_products().await.unwrap();

        let empty = state.cart_totals().unwrap();
        assert_eq!(empty.total, Decimal::ZERO);
        assert_eq!(empty.shipping, Decimal::ZERO);

        state.add_to_cart(&id("shirt1"), "L").await.unwrap();
        let totals = state.cart_totals().unwrap();
        assert_eq!(totals.subtotal, Decimal::from(20));
        assert_eq!(totals.shipping, Decimal::from(10));
        assert_eq!(totals.total, Decimal::from(30));
        assert_eq!(state.format_price(totals.total), "$30.00");
    }

    #[tokio::test]
    async fn test_cart_lines_join_catalog() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![Product::new("shirt1", 20)]));
        let state = state_with(backend);
        state.load_products().await.unwrap();
        state.add_to_cart(&id("shirt1"), "M").await.unwrap();
        state.add_to_cart(&id("shirt1"), "M").await.unwrap();
        state.add_to_cart(&id("unknown"), "S").await.unwrap();

        let lines = state.cart_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line.product_id, id("shirt1"));
        assert_eq!(lines[0].line_total(), Some(Decimal::from(40)));
        assert!(lines[1].product.is_none());
        assert_eq!(lines[1].line_total(), None);
    }

    #[tokio::test]
    async fn test_load_products_rejected_keeps_catalog() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![Product::new("a", 1)]));
        let state = state_with(backend.clone());
        state.load_products().await.unwrap();
        backend.reject_with("Catalog unavailable");
        let mut notices = state.subscribe_notices();

        let err = state.load_products().await.unwrap_err();

        assert!(matches!(err, ShopError::Backend(BackendError::Rejected(_))));
        assert_eq!(state.catalog().len(), 1);
        assert_eq!(notices.try_recv().unwrap(), Notice::error("Catalog unavailable"));
    }

    #[tokio::test]
    async fn test_load_user_cart_replaces_local_cart() {
        let mut stored = CartItems::new();
        stored.increment(&id("remote"), &size("L"));
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", stored.clone()));
        let state = state_with(backend);
        state.add_to_cart(&id("local"), "M").await.unwrap();

        state.load_user_cart(&token("jwt")).await.unwrap();
        assert_eq!(state.cart_items(), stored);

        // Same response twice, same result
        state.load_user_cart(&token("jwt")).await.unwrap();
        assert_eq!(state.cart_items(), stored);
    }

    #[tokio::test]
    async fn test_load_user_cart_rejected_is_silent() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        state.add_to_cart(&id("local"), "M").await.unwrap();
        let mut notices = state.subscribe_notices();

        let result = state.load_user_cart(&token("unknown")).await;

        assert!(result.is_err());
        assert_eq!(state.cart_items().quantity("local", "M"), 1);
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_restores_session() {
        let mut stored = CartItems::new();
        stored.increment(&id("shirt1"), &size("M"));
        let backend = Arc::new(
            InMemoryBackend::new()
                .with_products(vec![Product::new("shirt1", 20)])
                .with_user("jwt", stored),
        );
        let tokens = Arc::new(MemoryTokenStore::with_token(token("jwt")));
        let state = ShopState::new(config(), backend, tokens);

        state.bootstrap().await.unwrap();

        assert!(state.is_authenticated());
        assert_eq!(state.catalog().len(), 1);
        assert_eq!(state.cart_amount().unwrap(), Decimal::from(20));
    }

    #[tokio::test]
    async fn test_bootstrap_without_token_stays_local() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![Product::new("a", 1)]));
        let state = state_with(backend.clone());

        state.bootstrap().await.unwrap();

        assert!(!state.is_authenticated());
        assert_eq!(backend.calls(), vec![BackendCall::ListProducts]);
    }

    #[tokio::test]
    async fn test_bootstrap_survives_backend_outage() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_with_status(503, "maintenance");
        let state = state_with(backend);

        assert!(state.bootstrap().await.is_ok());
        assert!(state.catalog().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_cart() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let state = ShopState::new(config(), Arc::new(InMemoryBackend::new()), tokens.clone());
        state.set_token(token("jwt")).unwrap();
        state.add_to_cart(&id("p"), "M").await.unwrap();

        state.sign_out().unwrap();

        assert!(!state.is_authenticated());
        assert!(state.cart_items().is_empty());
        assert!(tokens.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_state() {
        let backend = Arc::new(InMemoryBackend::new().with_products(vec![
            Product {
                name: "Cotton Shirt".to_string(),
                ..Product::new("a", 10)
            },
            Product {
                name: "Denim Jacket".to_string(),
                ..Product::new("b", 30)
            },
        ]));
        let state = state_with(backend);
        state.load_products().await.unwrap();

        assert!(state.show_search());
        assert_eq!(state.visible_products().len(), 2);

        state.set_search("jacket");
        assert_eq!(state.search(), "jacket");
        let visible = state.visible_products();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, id("b"));

        state.set_show_search(false);
        assert_eq!(state.visible_products().len(), 2);
    }

    #[test]
    fn test_update_quantity_without_runtime_changes_nothing() {
        let backend = Arc::new(InMemoryBackend::new().with_user("jwt", CartItems::new()));
        let state = state_with(backend.clone());
        state.set_token(token("jwt")).unwrap();
        let mut cart = CartItems::new();
        cart.increment(&id("p"), &size("M"));
        state.replace_cart(cart);

        let err = state.update_quantity(&id("p"), &size("M"), 3).unwrap_err();

        assert!(matches!(err, ShopError::NoRuntime));
        assert_eq!(state.cart_items().quantity("p", "M"), 1);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_update_quantity_without_runtime_when_signed_out() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        let mut cart = CartItems::new();
        cart.increment(&id("p"), &size("M"));
        state.replace_cart(cart);

        let handle = state.update_quantity(&id("p"), &size("M"), 3).unwrap();

        assert!(handle.is_none());
        assert_eq!(state.cart_items().quantity("p", "M"), 3);
    }

    #[tokio::test]
    async fn test_product_observers_see_catalog_loads() {
        let backend = Arc::new(
            InMemoryBackend::new().with_products(vec![Product::new("a", 1), Product::new("b", 2)]),
        );
        let state = state_with(backend.clone());
        let mut rx = state.subscribe_products();
        assert!(!rx.has_changed().unwrap());

        state.load_products().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);

        backend.reject_with("Catalog unavailable");
        assert!(state.load_products().await.is_err());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 2);
    }

    #[test]
    fn test_session_changes_are_announced() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        let mut notices = state.subscribe_notices();

        state.set_token(token("jwt")).unwrap();
        state.sign_out().unwrap();

        let signed_in = notices.try_recv().unwrap();
        assert_eq!(signed_in.level, NoticeLevel::Success);
        assert_eq!(signed_in.message, "Signed in.");
        assert_eq!(notices.try_recv().unwrap(), Notice::info("Signed out."));
    }

    #[test]
    fn test_config_accessors() {
        let state = state_with(Arc::new(InMemoryBackend::new()));
        assert_eq!(state.currency(), "$");
        assert_eq!(state.delivery_fee(), Decimal::from(10));
        assert_eq!(state.backend_url().as_str(), "http://localhost:4000/");
    }
}
