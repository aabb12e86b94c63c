//! Best-effort persistence of confirmed orders and shop-added products.
//!
//! Two collections are mirrored into a [`KeyValueStore`] as JSON arrays:
//! the order history under [`ORDERS_KEY`] and the full catalog under
//! [`CATALOG_KEY`]. Writes happen inside effects and never fail a
//! transition; reads happen once at hydration and degrade to an empty
//! collection.
//!
//! Effects of successive transitions run on independent tasks, so a
//! [`CollectionWriter`] numbers every snapshot when the reducer takes it and
//! drops any snapshot older than the one already stored.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use storefront_core::effect::Effect;
use storefront_core::key_value::{KeyValueError, KeyValueFuture, KeyValueStore};

/// Key holding the JSON-serialized order history
pub const ORDERS_KEY: &str = "orders";

/// Key holding the JSON-serialized catalog
pub const CATALOG_KEY: &str = "pizzas";

/// Key-value store keeping one `<key>.json` file per key
///
/// The directory is created on the first write. Each write goes to its own
/// temporary file that is renamed over the target, so a crash never leaves a
/// half-written collection behind. Writes and removals through one store
/// (and its clones) run one at a time.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    root: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    tmp_seq: Arc<AtomicU64>,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            tmp_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Directory holding the files
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KeyValueError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KeyValueError::Unavailable(format!(
                "invalid storage key '{key}'"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, error: &std::io::Error) -> KeyValueError {
    KeyValueError::Io(format!("{}: {error}", path.display()))
}

impl KeyValueStore for FileKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
                Err(error) => Err(io_error(&path, &error)),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> KeyValueFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let _guard = self.write_lock.lock().await;
            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| io_error(&self.root, &e))?;

            let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
            let tmp = self
                .root
                .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));
            if let Err(error) = tokio::fs::write(&tmp, value).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(io_error(&tmp, &error));
            }
            if let Err(error) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(io_error(&path, &error));
            }
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let _guard = self.write_lock.lock().await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(io_error(&path, &error)),
            }
        })
    }
}

/// Reads a JSON array stored under `key`
///
/// Missing data yields an empty collection. A read failure or malformed
/// JSON is logged and also yields an empty collection.
///
/// The collection is decoded as a whole: a single entry that does not
/// deserialize, such as a product whose `category` is neither `vegetarian`
/// nor `non-vegetarian`, discards every entry stored under `key`.
pub async fn load_collection<T>(storage: &dyn KeyValueStore, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "No persisted data");
            return Vec::new();
        },
        Err(error) => {
            tracing::warn!(key, error = %error, "Failed to read persisted data, using defaults");
            return Vec::new();
        },
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(error) => {
            tracing::warn!(key, error = %error, "Discarding malformed persisted data");
            Vec::new()
        },
    }
}

/// Mirrors one collection into storage, newest snapshot wins
///
/// [`CollectionWriter::persist`] is called from the reducer, which runs one
/// action at a time, so snapshot generations follow transition order. The
/// write effects themselves may run in any order; each one waits for the
/// writer's lock and skips itself when a newer generation is already stored.
pub struct CollectionWriter {
    storage: Arc<dyn KeyValueStore>,
    key: &'static str,
    issued: AtomicU64,
    stored: tokio::sync::Mutex<u64>,
}

impl CollectionWriter {
    /// Creates a writer for `key`
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            storage,
            key,
            issued: AtomicU64::new(0),
            stored: tokio::sync::Mutex::new(0),
        }
    }

    /// Storage key this writer owns
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Builds an effect writing `items` as a JSON array
    ///
    /// The snapshot is serialized now, so later transitions cannot change what
    /// gets written. A serialization failure is logged and yields
    /// [`Effect::None`]; a failed write is logged and feeds nothing back.
    pub fn persist<A, T>(self: &Arc<Self>, items: &[T]) -> Effect<A>
    where
        A: Send + 'static,
        T: Serialize,
    {
        let key = self.key;
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(key, error = %error, "Failed to serialize collection");
                return Effect::None;
            },
        };

        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let writer = Arc::clone(self);
        Effect::fire_and_forget(async move { writer.write(generation, payload).await })
    }

    async fn write(&self, generation: u64, payload: String) {
        let key = self.key;
        let mut stored = self.stored.lock().await;
        if generation <= *stored {
            tracing::debug!(key, generation, stored = *stored, "Skipping superseded snapshot");
            return;
        }

        match self.storage.set(key, payload).await {
            Ok(()) => {
                *stored = generation;
                tracing::debug!(key, generation, "Persisted collection");
            },
            Err(error) => {
                tracing::warn!(key, error = %error, "Failed to persist collection, continuing in memory");
            },
        }
    }
}

impl std::fmt::Debug for CollectionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionWriter")
            .field("key", &self.key)
            .field("issued", &self.issued.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
