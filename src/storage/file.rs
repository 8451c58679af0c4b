//! File-backed persistent store.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{PersistentStore, StorageError};

/// Store that keeps every entry in a single JSON document on disk.
///
/// The document is read once at [`FileStore::open`] and rewritten after each
/// mutation (temp file + rename, so a crash never leaves half a document).
/// A failed write rolls the in-memory view back, so the store always mirrors
/// what is on disk.
pub struct FileStore {
    path: PathBuf,
    quota: Option<usize>,
    state: Mutex<FileState>,
}

struct FileState {
    entries: HashMap<String, String>,
    used_bytes: usize,
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; the file is only created on the
    /// first write.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries: HashMap<String, String> = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        let used_bytes = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
        info!(
            "Opened file store at {} ({} entries, {} bytes)",
            path.display(),
            entries.len(),
            used_bytes
        );

        Ok(Self {
            path,
            quota,
            state: Mutex::new(FileState {
                entries,
                used_bytes,
            }),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes currently used (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.state.lock().used_bytes
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        fs::write(&tmp, serde_json::to_vec(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state.lock().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock();

        let freed = state
            .entries
            .get(key)
            .map(|old| entry_size(key, old))
            .unwrap_or(0);
        let required = state.used_bytes - freed + entry_size(key, value);

        if let Some(limit) = self.quota
            && required > limit
        {
            return Err(StorageError::QuotaExceeded { limit, required });
        }

        let previous = state.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&state.entries) {
            match previous {
                Some(old) => state.entries.insert(key.to_string(), old),
                None => state.entries.remove(key),
            };
            return Err(e);
        }

        state.used_bytes = required;
        debug!("File store wrote {} ({} bytes used)", key, required);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock();

        let Some(old) = state.entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&state.entries) {
            state.entries.insert(key.to_string(), old);
            return Err(e);
        }

        state.used_bytes -= entry_size(key, &old);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.state.lock().entries.keys().cloned().collect())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("quota", &self.quota)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested/store.json"), None).unwrap();

        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path, None).unwrap();
            store.set("ui-demo-cache:a", "1").unwrap();
            store.set("other", "2").unwrap();
            store.remove("other").unwrap();
        }

        let reopened = FileStore::open(&path, None).unwrap();
        assert_eq!(reopened.get("ui-demo-cache:a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("other").unwrap(), None);
        assert_eq!(reopened.used_bytes(), "ui-demo-cache:a".len() + 1);
    }

    #[test]
    fn test_tmp_named_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.tmp");

        FileStore::open(&path, None).unwrap().set("k", "v").unwrap();

        let reopened = FileStore::open(&path, None).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
        assert!(!dir.path().join("storage.tmp.tmp").exists());
    }

    #[test]
    fn test_quota_rejects_and_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"), Some(10)).unwrap();

        store.set("k", "12345").unwrap();
        let err = store.set("big", "0123456789").unwrap_err();

        assert!(matches!(
            err,
            StorageError::QuotaExceeded { limit: 10, required: 19 }
        ));
        assert_eq!(store.get("big").unwrap(), None);
        assert_eq!(store.used_bytes(), 6);
    }

    #[test]
    fn test_overwrite_counts_replaced_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"), Some(8)).unwrap();

        store.set("k", "1234567").unwrap();
        // Replacing frees the old value first, so this fits.
        store.set("k", "abcdefg").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("abcdefg"));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileStore::open(&path, None).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
