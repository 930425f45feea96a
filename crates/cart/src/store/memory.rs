//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::{KeyValueStore, StoreChange};

/// Capacity of the change-notification channel.
///
/// Slow subscribers that fall further behind than this see a `Lagged`
/// error and re-read the store, so a small buffer is enough.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Process-wide in-memory store.
///
/// Shared between session instances via `Arc`; every write notifies all
/// subscribers. This is the substrate used by tests and by clients that
/// do not need persistence across restarts.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn notify(&self, key: &str) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
        self.notify(key);
    }

    fn remove(&self, key: &str) {
        let removed = self.entries().remove(key).is_some();
        if removed {
            self.notify(key);
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test]
    async fn test_set_notifies_subscribers() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.set("user", "{}");

        let change = changes.recv().await.unwrap();
        assert_eq!(change.key, "user");
    }

    #[tokio::test]
    async fn test_remove_of_absent_key_does_not_notify() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.remove("missing");
        store.set("present", "1");

        // The first notification is the set, not the no-op remove.
        let change = changes.recv().await.unwrap();
        assert_eq!(change.key, "present");
    }
}
