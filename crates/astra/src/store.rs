//! Key-value persistence port used by the progression engine.
//!
//! Values are plain strings; callers decide the encoding of each key. Two
//! implementations ship with the crate: [`InMemoryStore`] for tests and
//! embedding, and [`FileStore`] which keeps every entry in one JSON document
//! on disk and rewrites it on each write.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization/Deserialization error: {0}")]
    CodecError(String),
    #[error("Other store error: {0}")]
    Other(String),
}

/// Trait for abstracting flat key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Other("store lock poisoned".into())
}

/// An in-memory implementation of the `KeyValueStore` trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON-file backed store.
///
/// The whole document is loaded at open time and rewritten through a
/// temporary file plus rename on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Name of the state document inside a data directory.
    pub const FILE_NAME: &'static str = "state.json";

    /// Opens (or lazily creates) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::CodecError(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("opened state store at {}", path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Opens `state.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::CodecError(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_roundtrip() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("astra_xp").unwrap(), None);
        store.set("astra_xp", "42").unwrap();
        assert_eq!(store.get("astra_xp").unwrap().as_deref(), Some("42"));
        store.set("astra_xp", "43").unwrap();
        assert_eq!(store.get("astra_xp").unwrap().as_deref(), Some("43"));
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::in_dir(temp_dir.path()).unwrap();
            store.set("astra_xp", "110").unwrap();
            store.set("astra_skills", r#"{"Physics":10}"#).unwrap();
        }

        let reopened = FileStore::in_dir(temp_dir.path()).unwrap();
        assert_eq!(reopened.get("astra_xp").unwrap().as_deref(), Some("110"));
        assert_eq!(
            reopened.get("astra_skills").unwrap().as_deref(),
            Some(r#"{"Physics":10}"#)
        );
    }

    #[test]
    fn test_file_store_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileStore::in_dir(&nested).unwrap();
        store.set("k", "v").unwrap();
        assert!(nested.join(FileStore::FILE_NAME).exists());
    }

    #[test]
    fn test_file_store_rejects_corrupt_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(FileStore::FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::CodecError(_))
        ));
    }
}
