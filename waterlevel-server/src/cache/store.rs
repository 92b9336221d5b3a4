//! Durable blob stores for the snapshot cache.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Errors from reading or writing the durable cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Store could not be read or written
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded
    #[error("failed to serialize cache: {0}")]
    Serialize(String),

    /// Stored blob is not a valid snapshot
    #[error("failed to deserialize cache: {0}")]
    Deserialize(String),
}

/// Load/save of one opaque JSON blob.
pub trait SnapshotStore {
    /// Read the blob. `Ok(None)` if nothing has been stored yet.
    fn load(&self) -> Result<Option<String>, CacheError>;

    /// Replace the blob.
    fn save(&self, blob: &str) -> Result<(), CacheError>;
}

/// Stores the blob in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// File used when no path is configured.
    pub const DEFAULT_PATH: &'static str = "waterlevel_cache.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates parent directories if they don't exist.
    fn save(&self, blob: &str) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, blob)?;
        Ok(())
    }
}

/// Keeps the blob in memory. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RwLock<Option<String>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing blob.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail.
    pub fn failing() -> Self {
        Self {
            blob: RwLock::new(None),
            fail_saves: true,
        }
    }

    /// Current contents.
    pub fn blob(&self) -> Option<String> {
        self.blob
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, CacheError> {
        Ok(self.blob())
    }

    fn save(&self, blob: &str) -> Result<(), CacheError> {
        if self.fail_saves {
            return Err(CacheError::Io(std::io::Error::other("store is read-only")));
        }
        *self
            .blob
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_save_and_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache.json"));

        store.save("{\"a\":1}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("cache.json");
        let store = FileStore::new(&path);

        store.save("{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unreadable_path_is_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be read as a file.
        let store = FileStore::new(dir.path());
        assert!(store.load().is_err());
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save("x").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn failing_store_rejects_saves() {
        let store = MemoryStore::failing();
        let err = store.save("x").unwrap_err();
        assert!(err.to_string().contains("read-only"));
        assert!(store.blob().is_none());
    }
}
