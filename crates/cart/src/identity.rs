//! Current-user identity record.
//!
//! The identity record is written exclusively by the external
//! login/logout flow; the cart session only reads it - at construction
//! and again on every detected change.

use serde::{Deserialize, Serialize};

use bodega_core::{Role, UserId};

use crate::store::KeyValueStore;

/// Storage key for the current-user record.
pub const USER_KEY: &str = "user";

/// The logged-in user, as mirrored from the identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's account ID.
    pub id: UserId,
    /// Account role; only customers may mutate a cart.
    #[serde(default)]
    pub role: Role,
    /// User's email address.
    pub email: String,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl CurrentUser {
    /// Read the identity record from the store.
    ///
    /// Returns `None` when no record exists or the record fails to
    /// deserialize; a corrupt record reads as "nobody logged in".
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        let raw = store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable identity record");
                None
            }
        }
    }
}
