//! Persistent session token store.
//!
//! Pure storage: the token and the epoch-millisecond time it was stored,
//! under two fixed keys. Validity is decided by `SessionPolicy`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::clock::{Clock, SystemClock};

use super::storage::{FileStorage, MemoryStorage, Storage};

pub const TOKEN_KEY: &str = "auth_token";
pub const TOKEN_TIMESTAMP_KEY: &str = "auth_token_timestamp";

/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Store backed by `storage.json` in `dir`, using the wall clock.
    pub fn open(dir: &Path) -> Result<Self> {
        let storage = FileStorage::open(dir)?;
        Ok(Self::new(Arc::new(storage), Arc::new(SystemClock)))
    }

    /// Store that forgets everything on exit.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(SystemClock))
    }

    /// The stored token. An empty value counts as absent.
    pub fn get(&self) -> Option<String> {
        self.storage
            .get_item(TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    /// Store `token` stamped with the current time.
    pub fn set(&self, token: &str) -> Result<()> {
        let issued_at = self.clock.now_millis();
        self.storage.set_item(TOKEN_KEY, token)?;
        self.storage
            .set_item(TOKEN_TIMESTAMP_KEY, &issued_at.to_string())?;
        Ok(())
    }

    /// Remove both the token and its timestamp. Removing nothing is fine.
    pub fn remove(&self) -> Result<()> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(TOKEN_TIMESTAMP_KEY)?;
        Ok(())
    }

    /// Issuance time in epoch milliseconds. Unparsable values count as absent.
    pub fn issued_at(&self) -> Option<i64> {
        self.storage
            .get_item(TOKEN_TIMESTAMP_KEY)
            .and_then(|raw| raw.trim().parse().ok())
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};

    use super::*;
    use crate::clock::ManualClock;

    fn store_at(millis: i64) -> (TokenStore, Arc<MemoryStorage>, ManualClock) {
        let clock = ManualClock::new(DateTime::from_timestamp_millis(millis).unwrap());
        let storage = Arc::new(MemoryStorage::new());
        let store = TokenStore::new(storage.clone(), Arc::new(clock.clone()));
        (store, storage, clock)
    }

    #[test]
    fn test_set_records_token_and_timestamp() {
        let (store, storage, _) = store_at(1_700_000_000_123);

        store.set("tok").unwrap();

        assert_eq!(store.get().as_deref(), Some("tok"));
        assert_eq!(store.issued_at(), Some(1_700_000_000_123));
        assert_eq!(
            storage.get_item(TOKEN_TIMESTAMP_KEY).as_deref(),
            Some("1700000000123")
        );
    }

    #[test]
    fn test_set_again_restamps() {
        let (store, _, clock) = store_at(1_000);
        store.set("first").unwrap();

        clock.advance(Duration::seconds(5));
        store.set("second").unwrap();

        assert_eq!(store.get().as_deref(), Some("second"));
        assert_eq!(store.issued_at(), Some(6_000));
    }

    #[test]
    fn test_remove_clears_both_keys() {
        let (store, storage, _) = store_at(1_000);
        store.set("tok").unwrap();

        store.remove().unwrap();

        assert_eq!(store.get(), None);
        assert_eq!(store.issued_at(), None);
        assert_eq!(storage.get_item(TOKEN_TIMESTAMP_KEY), None);
    }

    #[test]
    fn test_remove_on_empty_store_is_ok() {
        let (store, _, _) = store_at(1_000);
        assert!(store.remove().is_ok());
        assert!(store.remove().is_ok());
    }

    #[test]
    fn test_garbage_timestamp_is_absent() {
        let (store, storage, _) = store_at(1_000);
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(TOKEN_TIMESTAMP_KEY, "yesterday").unwrap();

        assert_eq!(store.get().as_deref(), Some("tok"));
        assert_eq!(store.issued_at(), None);
    }

    #[test]
    fn test_clones_share_backend() {
        let (store, _, _) = store_at(1_000);
        let other = store.clone();

        store.set("tok").unwrap();
        assert_eq!(other.get().as_deref(), Some("tok"));

        other.remove().unwrap();
        assert_eq!(store.get(), None);
    }
}
