use crate::domain::TrackerError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key of the full application document in the durable store.
pub const DATA_KEY: &str = "ft_data";
/// Where an unusable durable document is copied before it is reinitialized.
pub const DATA_BACKUP_KEY: &str = "ft_data.bak";
/// Key of the in-progress session in the scratch store.
pub const CURRENT_SESSION_KEY: &str = "ft_current";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error for '{key}': {source}")]
    Io { key: String, source: io::Error },
    #[error("storage quota exceeded for '{key}': {size} bytes over the {limit} byte limit")]
    QuotaExceeded { key: String, size: usize, limit: usize },
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        TrackerError::Persistence(err.to_string())
    }
}

/// String key/value storage holding whole documents.
///
/// Every `set` overwrites the full value; callers never rely on partial
/// writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

fn check_quota(quota: Option<usize>, key: &str, value: &str) -> Result<(), StoreError> {
    match quota {
        Some(limit) if value.len() > limit => Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_quota(self.quota, key, value)?;
        let io_err = |source: io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_err)?;
        fs::rename(&staging, &target).map_err(io_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        check_quota(self.quota, key, value)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads an import file in full.
pub fn read_import_file(path: &Path) -> Result<String, TrackerError> {
    fs::read_to_string(path)
        .map_err(|e| TrackerError::MalformedImport(format!("{}: {}", path.display(), e)))
}

/// Writes an export document into `dir` and returns the full path.
pub fn write_export_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, TrackerError> {
    let path = dir.join(filename);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, content))
        .map_err(|e| TrackerError::Persistence(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));

        assert_eq!(store.get(DATA_KEY).unwrap(), None);
        store.set(DATA_KEY, "{\"version\":1}").unwrap();
        assert_eq!(store.get(DATA_KEY).unwrap().as_deref(), Some("{\"version\":1}"));
        assert!(dir.path().join("data").join("ft_data.json").exists());
        assert!(!dir.path().join("data").join("ft_data.json.tmp").exists());
    }

    #[test]
    fn test_file_store_overwrites_whole_value() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());

        store.set(CURRENT_SESSION_KEY, "a much longer first value").unwrap();
        store.set(CURRENT_SESSION_KEY, "short").unwrap();
        assert_eq!(store.get(CURRENT_SESSION_KEY).unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());

        store.remove(CURRENT_SESSION_KEY).unwrap();
        store.set(CURRENT_SESSION_KEY, "x").unwrap();
        store.remove(CURRENT_SESSION_KEY).unwrap();
        assert_eq!(store.get(CURRENT_SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_quota() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path()).with_quota(Some(4));

        let err = store.set(DATA_KEY, "12345").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { size: 5, limit: 4, .. }));
        assert_eq!(store.get(DATA_KEY).unwrap(), None);
        store.set(DATA_KEY, "1234").unwrap();
    }

    #[test]
    fn test_memory_store_quota_keeps_previous_value() {
        let mut store = MemoryStore::new();
        store.set(DATA_KEY, "old").unwrap();
        store.set_quota(Some(3));

        assert!(store.set(DATA_KEY, "newer").is_err());
        assert_eq!(store.get(DATA_KEY).unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_store_error_becomes_persistence_error() {
        let err: TrackerError = StoreError::QuotaExceeded {
            key: DATA_KEY.to_string(),
            size: 10,
            limit: 5,
        }
        .into();
        assert!(matches!(err, TrackerError::Persistence(msg) if msg.contains("quota")));
    }

    #[test]
    fn test_export_file_written() {
        let dir = TempDir::new().unwrap();
        let path = write_export_file(dir.path(), "out.json", "{}").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_missing_import_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let err = read_import_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedImport(_)));
    }
}
