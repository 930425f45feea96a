//! Local key-value persistence substrate.
//!
//! The session manager reads and writes through the [`KeyValueStore`]
//! seam: a namespaced string store with change notifications, shared by
//! every execution context of the client. [`MemoryStore`] backs tests and
//! single-process use; [`JsonFileStore`] persists across restarts.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use bodega_core::UserId;

use crate::cart::{Cart, LineItem};

/// Storage key for the anonymous cart.
pub const GUEST_CART_KEY: &str = "cart_guest";

/// Storage key prefix for per-user carts.
pub const USER_CART_PREFIX: &str = "cart_user_";

/// A change notification for one store key.
///
/// The analog of the platform storage event: fired by a store whenever
/// one of its keys is written or removed, so other components (and other
/// session instances sharing the store) can react without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// The key that was written or removed.
    pub key: String,
}

/// Generic local key-value store.
///
/// Implementations are shared across the whole client process; keys are
/// namespaced by their owners (`user` for the identity record,
/// `cart_guest` / `cart_user_<id>` for carts). Writes are synchronous
/// and best-effort from the caller's point of view.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Fetch the value for a key, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value under a key, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove a key. No-op when absent.
    fn remove(&self, key: &str);

    /// Subscribe to change notifications for this store.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Which logical cart a read or write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartScope {
    /// The anonymous cart, active while nobody is logged in.
    Guest,
    /// The saved cart of a specific user.
    User(UserId),
}

impl CartScope {
    /// Scope matching the given identity.
    #[must_use]
    pub fn for_user(user: Option<UserId>) -> Self {
        user.map_or(Self::Guest, Self::User)
    }

    /// The storage key for this scope.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Guest => GUEST_CART_KEY.to_string(),
            Self::User(id) => format!("{USER_CART_PREFIX}{id}"),
        }
    }
}

/// Serialized form of a persisted cart.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCart {
    items: Vec<LineItem>,
    updated_at: DateTime<Utc>,
}

/// Load the cart persisted under a scope.
///
/// An absent record or a record that fails to deserialize both read as
/// an empty cart; the failure is logged and swallowed.
#[must_use]
pub fn load_cart(store: &dyn KeyValueStore, scope: CartScope) -> Cart {
    let key = scope.key();
    let Some(raw) = store.get(&key) else {
        return Cart::new();
    };
    match serde_json::from_str::<StoredCart>(&raw) {
        Ok(stored) => Cart::from_items(stored.items),
        Err(e) => {
            tracing::debug!(%key, error = %e, "discarding unreadable persisted cart");
            Cart::new()
        }
    }
}

/// Persist a cart under a scope.
///
/// Write-through: called synchronously after every mutation. A cart that
/// fails to serialize is skipped with a warning; the in-memory state
/// stays authoritative.
pub fn save_cart(store: &dyn KeyValueStore, scope: CartScope, cart: &Cart) {
    let stored = StoredCart {
        items: cart.items().to_vec(),
        updated_at: Utc::now(),
    };
    match serde_json::to_string(&stored) {
        Ok(raw) => store.set(&scope.key(), &raw),
        Err(e) => tracing::warn!(key = %scope.key(), error = %e, "failed to serialize cart"),
    }
}
