//! [`PaginationStorage`] implementations.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;

use crate::application::pagination::{PaginationStorage, StorageError};
use crate::cache::mutex_lock;

/// Process-local storage. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaginationStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by one JSON object file mapping keys to raw values.
///
/// Writes go to a sibling temp file that is then renamed over the original.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl PaginationStorage for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = mutex_lock(&self.write_lock, "infra::storage", "load");
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = mutex_lock(&self.write_lock, "infra::storage", "save");
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.load("k").expect("load").is_none());

        storage.save("k", "{}").expect("save");
        assert_eq!(storage.load("k").expect("load").as_deref(), Some("{}"));
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state").join("pagination.json");
        let storage = JsonFileStorage::new(&path);

        assert!(storage.load("a").expect("missing file").is_none());

        storage.save("a", r#"{"current":1,"pageSize":10}"#).expect("save a");
        storage.save("b", r#"{"current":4,"pageSize":20}"#).expect("save b");

        let reopened = JsonFileStorage::new(&path);
        assert_eq!(
            reopened.load("a").expect("load a").as_deref(),
            Some(r#"{"current":1,"pageSize":10}"#)
        );
        assert_eq!(
            reopened.load("b").expect("load b").as_deref(),
            Some(r#"{"current":4,"pageSize":20}"#)
        );
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pagination.json");
        fs::write(&path, "not json").expect("write");

        let err = JsonFileStorage::new(&path).load("a").unwrap_err();
        assert!(matches!(err, StorageError::Format(_)));
    }
}
