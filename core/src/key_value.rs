//! Key-value storage trait for best-effort local persistence.
//!
//! The storefront keeps its working state in memory and mirrors a couple of
//! collections (confirmed orders, shop-added products) into a key-value store
//! so they survive a restart. This module defines that storage seam.
//!
//! # Implementations
//!
//! - `FileKeyValueStore` (in the `storefront` crate): one JSON file per key
//! - `InMemoryKeyValueStore` (in `storefront-testing`): fast, deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use storefront_core::key_value::{KeyValueError, KeyValueStore};
//!
//! async fn example<S: KeyValueStore>(store: &S) -> Result<(), KeyValueError> {
//!     store.set("orders", "[]".to_string()).await?;
//!     let raw = store.get("orders").await?;
//!     assert_eq!(raw.as_deref(), Some("[]"));
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStore`] methods.
pub type KeyValueFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, KeyValueError>> + Send + 'a>>;

/// Errors that can occur during key-value operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValueError {
    /// Underlying I/O failed (file system, socket, ...).
    #[error("I/O error: {0}")]
    Io(String),

    /// The backend refused the operation (quota, read-only, offline).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed, string-valued storage.
///
/// Values are opaque to the store; callers serialize them (the storefront
/// uses JSON). A `set` replaces any previous value for the key.
///
/// # Dyn Compatibility
///
/// Methods return [`KeyValueFuture`] instead of using `async fn` so the trait
/// can be used as `Arc<dyn KeyValueStore>` inside effects.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] if the backend cannot be read.
    fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] if the write fails.
    fn set<'a>(&'a self, key: &'a str, value: String) -> KeyValueFuture<'a, ()>;

    /// Delete the value stored under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueError`] if the backend cannot be modified.
    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, ()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapStore(Mutex<HashMap<String, String>>);

    impl KeyValueStore for MapStore {
        fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Option<String>> {
            Box::pin(async move { Ok(self.0.lock().unwrap().get(key).cloned()) })
        }

        fn set<'a>(&'a self, key: &'a str, value: String) -> KeyValueFuture<'a, ()> {
            Box::pin(async move {
                self.0.lock().unwrap().insert(key.to_string(), value);
                Ok(())
            })
        }

        fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, ()> {
            Box::pin(async move {
                self.0.lock().unwrap().remove(key);
                Ok(())
            })
        }
    }

    #[test]
    fn trait_is_usable_as_object() {
        let store: std::sync::Arc<dyn KeyValueStore> =
            std::sync::Arc::new(MapStore(Mutex::new(HashMap::new())));

        tokio_test::block_on(async {
            store.set("orders", "[1]".to_string()).await.unwrap();
            assert_eq!(store.get("orders").await.unwrap().as_deref(), Some("[1]"));
            store.remove("orders").await.unwrap();
            assert_eq!(store.get("orders").await.unwrap(), None);
        });
    }

    #[test]
    fn error_messages_name_the_cause() {
        assert_eq!(
            KeyValueError::Io("disk full".into()).to_string(),
            "I/O error: disk full"
        );
        assert_eq!(
            KeyValueError::Unavailable("read-only".into()).to_string(),
            "Storage unavailable: read-only"
        );
    }
}
