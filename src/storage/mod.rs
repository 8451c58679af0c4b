//! Persistent key-value storage.
//!
//! The tiered cache keeps a memory tier in front of a [`PersistentStore`].
//! Stores are string-valued and synchronous, and every call may fail: the
//! cache treats those failures as transient and degrades to memory only.
//!
//! - `MemoryStore` - `DashMap` backed, lives as long as the process
//! - `FileStore` - JSON document on disk with an optional byte quota

mod file;
mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Default quota for file-backed storage, matching what browsers give local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Errors raised by a persistent store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is disabled or cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A write would push the store past its quota.
    #[error("storage quota exceeded: {required} bytes needed, limit is {limit}")]
    QuotaExceeded { limit: usize, required: usize },

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be parsed or written.
    #[error("storage document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A synchronous string key-value store.
///
/// Keys are stored verbatim; namespacing (the cache prefix) is the
/// caller's job.
pub trait PersistentStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key is not present.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List every key currently stored.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
