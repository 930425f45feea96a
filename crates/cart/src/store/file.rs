//! File-backed key-value store.
//!
//! Persists the whole key space as one JSON document, the way a browser
//! profile persists localStorage. The document is read once at open and
//! rewritten after every mutation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::{KeyValueStore, StoreChange};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Key-value store persisted to a single JSON file.
///
/// Writes are best-effort: an I/O failure while rewriting the file is
/// logged as a warning and the in-memory view stays authoritative, so a
/// transiently unwritable disk degrades to session-only persistence.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<StoreChange>,
}

impl JsonFileStore {
    /// Open a store backed by the given file, creating parent directories
    /// as needed.
    ///
    /// A missing file opens as an empty store. A file that exists but
    /// fails to parse also opens empty (its content is unreadable either
    /// way, and the next write replaces it).
    ///
    /// # Errors
    ///
    /// Returns an error when the file or its parent directory cannot be
    /// accessed at all (permissions, not-a-directory, etc.).
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "store file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            changes,
        })
    }

    /// The file this store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Rewrite the backing file from the current entries. Best-effort.
    fn flush(&self, entries: &HashMap<String, String>) {
        let raw = match serde_json::to_string_pretty(entries) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to serialize store");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, raw) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write store file");
        }
    }

    fn notify(&self, key: &str) {
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
        });
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries);
        drop(entries);
        self.notify(key);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries();
        let removed = entries.remove(key).is_some();
        if removed {
            self.flush(&entries);
        }
        drop(entries);
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
    fn test_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("cart_guest", "[]");
            store.set("user", "{\"id\":1}");
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("cart_guest"), Some("[]".to_string()));
        assert_eq!(reopened.get("user"), Some("{\"id\":1}".to_string()));
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("fresh.json")).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("k", "v");
            store.remove("k");
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k"), None);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/profile/store.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v");

        assert!(path.exists());
    }
}
