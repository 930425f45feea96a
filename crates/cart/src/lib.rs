//! Bodega Cart - client-side cart session manager.
//!
//! Owns the shopping cart for one client session and keeps it
//! consistent across identity changes:
//!
//! - **Persistence**: every mutation is mirrored synchronously to a
//!   local key-value store, under `cart_guest` for anonymous sessions
//!   or `cart_user_<id>` once someone is logged in.
//! - **Identity watching**: login/logout transitions of the
//!   externally-owned `user` record are detected via store-change
//!   notifications plus a fallback polling timer.
//! - **Login merge**: when the login flow completes, the anonymous cart
//!   is folded into the user's saved cart with additive per-product
//!   quantities, and the guest record is deleted.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bodega_cart::session::CartSession;
//! use bodega_cart::store::{KeyValueStore, MemoryStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! let session = CartSession::new(store as Arc<dyn KeyValueStore>);
//! // ... presentational components call session.add_to_cart(...) etc.
//! session.close();
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod identity;
pub mod session;
pub mod store;

mod watcher;

pub use cart::{Cart, CartSummary, LineItem, Product};
pub use config::CartConfig;
pub use error::CartError;
pub use identity::CurrentUser;
pub use session::CartSession;
pub use store::{CartScope, JsonFileStore, KeyValueStore, MemoryStore};
