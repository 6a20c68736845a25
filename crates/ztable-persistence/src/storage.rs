//! Key/value storage channels
//!
//! Two channels exist per table: a local one that survives sessions (hidden columns, recent
//! searches) and a session one for larger navigation state (expanded rows). Both speak the
//! same string-keyed, string-valued interface.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{PersistenceError, PersistenceResult};

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PersistenceResult<()>;
    fn remove(&self, key: &str) -> PersistenceResult<()>;
}

/// Read a JSON value. Missing keys are `Ok(None)`.
pub fn get_json<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> PersistenceResult<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn set_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> PersistenceResult<()> {
    storage.set(key, &serde_json::to_string(value)?)
}

/// In-memory storage, optionally bounded or disabled to model restricted environments
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose total key+value size may not exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// Storage that rejects every operation, as in private browsing
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_available(&self) -> PersistenceResult<()> {
        if self.unavailable {
            return Err(PersistenceError::StorageUnavailable(
                "storage access denied".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        self.check_available()?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write();
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(PersistenceError::Quota(format!(
                    "writing '{}' would exceed {} bytes",
                    key, quota
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.check_available()?;
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object file, written through on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`
    pub fn open(path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_remove() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(8);
        storage.set("a", "1234").unwrap();
        let err = storage.set("b", "123456789").unwrap_err();
        assert!(matches!(err, PersistenceError::Quota(_)));
        storage.set("a", "1234567").unwrap();
    }

    #[test]
    fn test_unavailable_storage_errors() {
        let storage = MemoryStorage::unavailable();
        assert!(matches!(
            storage.get("k"),
            Err(PersistenceError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        set_json(&storage, "cols", &["a", "b"]).unwrap();
        let cols: Option<Vec<String>> = get_json(&storage, "cols").unwrap();
        assert_eq!(cols, Some(vec!["a".to_string(), "b".to_string()]));
        storage.set("bad", "{").unwrap();
        assert!(get_json::<Vec<String>>(&storage, "bad").is_err());
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("dt_hidden_columns", r#"["email"]"#).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get("dt_hidden_columns").unwrap().as_deref(),
            Some(r#"["email"]"#)
        );
        reopened.remove("dt_hidden_columns").unwrap();
        assert_eq!(FileStorage::open(&path).unwrap().get("dt_hidden_columns").unwrap(), None);
    }
}
