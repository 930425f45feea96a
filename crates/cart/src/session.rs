//! The cart session manager.
//!
//! One [`CartSession`] is constructed at application start and owns the
//! in-memory cart for its lifetime. Every mutation is mirrored to the
//! key-value store under the scope key matching the current identity;
//! the identity watcher retargets that scope when a login or logout is
//! detected. See [`Cart::merge_from`] for the login merge semantics.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use bodega_core::ProductId;

use crate::cart::{Cart, CartSummary, Product};
use crate::config::CartConfig;
use crate::error::Result;
use crate::identity::CurrentUser;
use crate::store::{
    CartScope, GUEST_CART_KEY, JsonFileStore, KeyValueStore, MemoryStore, load_cart, save_cart,
};
use crate::watcher;

/// Client-side cart session manager.
///
/// Owns the in-memory cart, persists it write-through, watches the
/// externally-owned identity record, and merges the anonymous cart into
/// the user's saved cart when the login flow completes. Constructed once
/// per client session; [`close`](Self::close) (or dropping the session)
/// tears the watcher down.
pub struct CartSession {
    inner: Arc<SessionInner>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the session handle and the watcher task.
pub(crate) struct SessionInner {
    pub(crate) store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
}

pub(crate) struct SessionState {
    pub(crate) cart: Cart,
    pub(crate) current_user: Option<CurrentUser>,
}

impl SessionInner {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let current_user = CurrentUser::load(store.as_ref());
        let scope = CartScope::for_user(current_user.as_ref().map(|u| u.id));
        let cart = load_cart(store.as_ref(), scope);
        Self {
            store,
            state: Mutex::new(SessionState { cart, current_user }),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the cart through to the scope of the current identity.
    fn persist(&self, state: &SessionState) {
        let scope = CartScope::for_user(state.current_user.as_ref().map(|u| u.id));
        save_cart(self.store.as_ref(), scope, &state.cart);
    }
}

impl CartSession {
    /// Create a session over the given store with default configuration.
    ///
    /// Must be called from within a tokio runtime; the identity watcher
    /// is spawned immediately.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, &CartConfig::default())
    }

    /// Create a session over the given store.
    #[must_use]
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let inner = Arc::new(SessionInner::new(store));
        let watcher = watcher::spawn(Arc::clone(&inner), config.poll_interval);
        Self {
            inner,
            watcher: Mutex::new(Some(watcher)),
        }
    }

    /// Create a session with a store selected by the configuration:
    /// file-backed when `store_path` is set, in-memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error when the store file cannot be opened.
    pub fn from_config(config: &CartConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(JsonFileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_config(store, config))
    }

    // =========================================================================
    // Read-only surface
    // =========================================================================

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state().cart.clone()
    }

    /// Derived cart summary (unit count and subtotal).
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.state().cart.summary()
    }

    /// Read-only mirror of the watcher's known identity.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.inner.state().current_user.clone()
    }

    // =========================================================================
    // Mutation API
    // =========================================================================

    /// Add one unit of a product to the cart.
    ///
    /// Silently rejected when the current account's role is not allowed
    /// to shop; guests may always add. An existing line item for the
    /// same product accumulates instead of duplicating.
    pub fn add_to_cart(&self, product: Product) {
        self.add_to_cart_with_quantity(product, 1);
    }

    /// Add several units of a product to the cart at once.
    ///
    /// Same policy as [`add_to_cart`](Self::add_to_cart).
    pub fn add_to_cart_with_quantity(&self, product: Product, quantity: u32) {
        let mut state = self.inner.state();
        if let Some(user) = &state.current_user {
            if !user.role.can_shop() {
                tracing::debug!(
                    user = %user.id,
                    role = %user.role,
                    "cart add rejected for non-customer account"
                );
                return;
            }
        }
        state.cart.add(product, quantity);
        self.inner.persist(&state);
    }

    /// Remove a product's line item. No-op when absent.
    pub fn remove_from_cart(&self, product_id: ProductId) {
        let mut state = self.inner.state();
        state.cart.remove(product_id);
        self.inner.persist(&state);
    }

    /// Decrement a product's quantity, removing the line item when it
    /// would reach zero. No-op when absent.
    pub fn decrease_quantity(&self, product_id: ProductId) {
        let mut state = self.inner.state();
        state.cart.decrease(product_id);
        self.inner.persist(&state);
    }

    /// Set a product's quantity to an absolute value; zero removes the
    /// line item. No-op when absent.
    pub fn update_quantity(&self, product_id: ProductId, quantity: u32) {
        let mut state = self.inner.state();
        state.cart.set_quantity(product_id, quantity);
        self.inner.persist(&state);
    }

    /// Empty the cart and persist the empty cart under the current
    /// scope.
    pub fn clear_cart(&self) {
        let mut state = self.inner.state();
        state.cart.clear();
        self.inner.persist(&state);
    }

    // =========================================================================
    // Login completion
    // =========================================================================

    /// Merge the pre-login cart into the just-logged-in user's saved
    /// cart.
    ///
    /// Invoked once by the login flow, immediately after it has written
    /// the identity record. Loads the user's saved cart, folds the
    /// anonymous cart into it (adding quantities per product, appending
    /// products new to the user), installs the result as the session
    /// cart, persists it under the user's scope, and deletes the guest
    /// record. A second invocation for the same login would double-count
    /// saved quantities; the login flow calls this exactly once.
    ///
    /// Without an identity record the call is a no-op.
    pub fn complete_login(&self) {
        let Some(user) = CurrentUser::load(self.inner.store.as_ref()) else {
            tracing::debug!("login completion without an identity record is a no-op");
            return;
        };

        let mut state = self.inner.state();
        let scope = CartScope::User(user.id);
        let mut merged = load_cart(self.inner.store.as_ref(), scope);
        let pre_login = std::mem::take(&mut state.cart);
        let pre_login_units = pre_login.item_count();
        merged.merge_from(pre_login);
        tracing::info!(
            user = %user.id,
            pre_login_units,
            merged_units = merged.item_count(),
            "merged anonymous cart into saved user cart"
        );

        state.cart = merged;
        state.current_user = Some(user);
        save_cart(self.inner.store.as_ref(), scope, &state.cart);
        self.inner.store.remove(GUEST_CART_KEY);
    }

    /// Alias of [`complete_login`](Self::complete_login), matching the
    /// name the login flow binds to.
    pub fn refresh_user_cart(&self) {
        self.complete_login();
    }

    /// Re-read the identity record and process any transition now,
    /// without waiting for the watcher. Idempotent.
    pub fn reconcile_now(&self) {
        watcher::reconcile(&self.inner);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Tear down the identity watcher. Safe to call more than once;
    /// also runs on drop.
    pub fn close(&self) {
        let handle = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for CartSession {
    fn drop(&mut self) {
        self.close();
    }
}
