//! Local persistent key-value store for session tokens.
//!
//! The session manager is the only writer. Values are plain strings under
//! fixed key names so a reload can rebuild the session.

mod file;

pub use file::FileStore;

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Access token key
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Refresh token key
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Role key, read by navigation guards after a reload
pub const ROLE_KEY: &str = "userRole";
/// Elevated bypass flag, `"true"` when set
pub const BYPASS_FLAG_KEY: &str = "isSuperadminMode";
/// JSON-encoded user profile
pub const PROFILE_KEY: &str = "userProfile";

/// Every key the session manager owns
pub const SESSION_KEYS: [&str; 5] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    ROLE_KEY,
    BYPASS_FLAG_KEY,
    PROFILE_KEY,
];

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// String key-value storage
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Remove every session key. A failing key does not stop the others;
    /// the first error is returned once all have been attempted.
    fn clear_session(&self) -> StoreResult<()> {
        let mut first_error = None;
        for key in SESSION_KEYS {
            if let Err(e) = self.remove(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Volatile store, used in tests and for sessions that must not outlive the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());

        store.set(ACCESS_TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear_session_leaves_foreign_keys() {
        let store = MemoryStore::new();
        for key in SESSION_KEYS {
            store.set(key, "x").unwrap();
        }
        store.set("theme", "dark").unwrap();

        store.clear_session().unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    /// Refuses to remove one key
    struct StuckKeyStore {
        inner: MemoryStore,
        stuck: &'static str,
    }

    impl SessionStore for StuckKeyStore {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            if key == self.stuck {
                return Err(StoreError::Io(format!("cannot remove {}", key)));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_clear_session_attempts_every_key() {
        let store = StuckKeyStore {
            inner: MemoryStore::new(),
            stuck: REFRESH_TOKEN_KEY,
        };
        for key in SESSION_KEYS {
            store.set(key, "x").unwrap();
        }

        let err = store.clear_session().unwrap_err();

        assert_eq!(err, StoreError::Io("cannot remove refreshToken".to_string()));
        assert_eq!(store.inner.len(), 1);
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_some());
        assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
        assert!(store.get(PROFILE_KEY).unwrap().is_none());
    }
}
