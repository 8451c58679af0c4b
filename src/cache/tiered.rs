//! Tiered read-through cache: memory tier in front of a persistent store.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{CacheConfig, MemoryTier};
use crate::storage::{PersistentStore, StorageError};

/// Prefix reserved for entries written by the tiered cache.
pub const DEFAULT_PREFIX: &str = "ui-demo-cache:";

/// Where a lookup was answered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Memory(String),
    /// Found in the persistent store and promoted into memory.
    Persistent(String),
    Miss,
}

impl Lookup {
    pub fn into_value(self) -> Option<String> {
        match self {
            Lookup::Memory(v) | Lookup::Persistent(v) => Some(v),
            Lookup::Miss => None,
        }
    }

    /// Name of the tier that answered, if any.
    pub fn tier(&self) -> Option<&'static str> {
        match self {
            Lookup::Memory(_) => Some("memory"),
            Lookup::Persistent(_) => Some("persistent"),
            Lookup::Miss => None,
        }
    }
}

/// Read-through cache over two tiers.
///
/// Reads check memory, then the persistent store; persistent hits are
/// promoted into memory. Writes always land in memory and are mirrored to
/// the store on a best-effort basis. Storage faults never reach callers of
/// [`get`](Self::get), [`set`](Self::set) or [`clear`](Self::clear); the
/// `try_*` variants report them instead.
///
/// There is no single-flight: two concurrent [`fetch_through`](Self::fetch_through)
/// calls on the same missing key both run their loader and the last one to
/// finish wins.
#[derive(Clone)]
pub struct TieredCache {
    memory: MemoryTier<String, String>,
    store: Arc<dyn PersistentStore>,
    prefix: Arc<str>,
}

impl TieredCache {
    /// Create a cache over `store`, namespacing persistent keys with `prefix`.
    pub fn new(
        store: Arc<dyn PersistentStore>,
        prefix: impl Into<Arc<str>>,
        config: &CacheConfig,
    ) -> Self {
        let prefix = prefix.into();
        debug!("Creating tiered cache with prefix {}", prefix);

        Self {
            memory: MemoryTier::new(format!("tiered:{prefix}"), config),
            store,
            prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Look a key up, reporting which tier answered.
    ///
    /// # Errors
    /// Returns the storage error when memory missed and the persistent
    /// store could not be read.
    pub fn try_lookup(&self, key: &str) -> Result<Lookup, StorageError> {
        if let Some(value) = self.memory.get(&key.to_string()) {
            debug!("Cache hit (memory): {}", key);
            return Ok(Lookup::Memory(value));
        }

        match self.store.get(&self.storage_key(key))? {
            Some(value) => {
                debug!("Cache hit (persistent), promoting: {}", key);
                self.memory.insert(key.to_string(), value.clone());
                Ok(Lookup::Persistent(value))
            }
            None => {
                debug!("Cache miss: {}", key);
                Ok(Lookup::Miss)
            }
        }
    }

    /// Like [`try_lookup`](Self::try_lookup), treating storage faults as a miss.
    pub fn lookup(&self, key: &str) -> Lookup {
        self.try_lookup(key).unwrap_or_else(|e| {
            warn!("Cache read failed for {}: {}", key, e);
            Lookup::Miss
        })
    }

    /// # Errors
    /// Returns the storage error when memory missed and the persistent
    /// store could not be read.
    pub fn try_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.try_lookup(key).map(Lookup::into_value)
    }

    /// Get a value from memory, falling back to the persistent store.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).into_value()
    }

    /// Store a value in both tiers.
    ///
    /// The memory write happens even when this returns an error.
    ///
    /// # Errors
    /// Returns the storage error if the persistent write failed.
    pub fn try_set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let value = value.into();
        self.memory.insert(key.to_string(), value.clone());
        self.store.set(&self.storage_key(key), &value)
    }

    /// Store a value, ignoring persistent-store failures.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.memory.insert(key.to_string(), value.clone());

        if let Err(e) = self.store.set(&self.storage_key(key), &value) {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// Return the cached value, or run `loader` once and cache its result.
    ///
    /// # Errors
    /// Returns the loader's error unchanged. Failures are not cached, so the
    /// next call runs a loader again.
    pub async fn fetch_through<F, Fut, E>(&self, key: &str, loader: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = loader().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    /// Empty the memory tier and remove every prefixed persistent entry.
    ///
    /// Removal keeps going past individual failures; the first one is
    /// returned after the sweep.
    ///
    /// # Errors
    /// Returns the first storage error seen while listing or removing keys.
    pub fn try_clear(&self) -> Result<usize, StorageError> {
        self.memory.invalidate_all();

        let mut removed = 0;
        let mut first_error = None;

        for key in self.store.keys()? {
            if !key.starts_with(&*self.prefix) {
                continue;
            }
            match self.store.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!("Failed to remove {} from storage: {}", key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!("Cleared {} persistent entries", removed);
                Ok(removed)
            }
        }
    }

    /// Clear both tiers, ignoring persistent-store failures.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!("Cache clear failed: {}", e);
        }
    }

    /// Number of entries held in memory.
    pub fn memory_len(&self) -> u64 {
        self.memory.entry_count()
    }
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("prefix", &self.prefix)
            .field("memory", &self.memory)
            .finish()
    }
}
