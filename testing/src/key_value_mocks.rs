//! In-memory key-value storage for fast, deterministic tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicked test

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use storefront_core::key_value::{KeyValueError, KeyValueFuture, KeyValueStore};

/// In-memory key-value store.
///
/// Clones share the same data, so a test can keep one handle for assertions
/// while the store under test owns another. Reads and writes can be made
/// to fail on demand to exercise degraded paths.
///
/// # Example
///
/// ```
/// use storefront_testing::InMemoryKeyValueStore;
/// use storefront_core::key_value::KeyValueStore;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryKeyValueStore::new();
/// store.set("orders", "[]".to_string()).await.unwrap();
/// assert_eq!(store.raw("orders").as_deref(), Some("[]"));
///
/// store.fail_writes(true);
/// assert!(store.set("orders", "[1]".to_string()).await.is_err());
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeyValueStore {
    data: Arc<RwLock<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut data = store.data.write().unwrap();
            for (key, value) in entries {
                data.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Make every subsequent read fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value under `key`, bypassing failure injection
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().unwrap().is_empty()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Option<String>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(KeyValueError::Unavailable(format!("read of '{key}' refused")));
            }
            Ok(self.raw(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> KeyValueFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(KeyValueError::Unavailable(format!("write of '{key}' refused")));
            }
            self.data.write().unwrap().insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(KeyValueError::Unavailable(format!("remove of '{key}' refused")));
            }
            self.data.write().unwrap().remove(key);
            Ok(())
        })
    }
}
