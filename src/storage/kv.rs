//! Key-value persistence for workspace documents.
//!
//! A workspace is stored as a handful of JSON documents, each under a fixed
//! key. The [`KeyValueStore`] trait hides where they live.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use serde_json::Value;

/// Errors raised while reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The document could not be read or written.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The document is not valid JSON, or does not have the expected shape.
    #[error("malformed document '{key}': {source}")]
    Json {
        /// The key of the offending document.
        key: String,
        /// The underlying error.
        source: serde_json::Error,
    },
}

/// Storage for JSON documents addressed by key.
pub trait KeyValueStore {
    /// Reads a document. An absent key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or parsed.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Writes a document, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError>;
}

/// An in-memory store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<String, Value>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.documents.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.documents.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Stores each document as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectory {
    root: PathBuf,
}

impl JsonDirectory {
    /// Opens a directory at the given path. It is created on first write.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory holding the documents.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonDirectory {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no document at {}", path.display());
                return Ok(None);
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Json {
                key: key.to_string(),
                source,
            })
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;

        let content = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;

        // write then rename, so a crash never leaves a half-written document
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, content).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        std::fs::rename(&staging, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("bookmarks").unwrap().is_none());

        store.set("bookmarks", &json!(["1.1.1"])).unwrap();

        assert_eq!(store.get("bookmarks").unwrap(), Some(json!(["1.1.1"])));
    }

    #[test]
    fn json_directory_writes_one_file_per_key() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonDirectory::new(tmp.path().join("data"));

        store.set("notifications", &json!([])).unwrap();

        assert!(tmp.path().join("data/notifications.json").exists());
        assert!(!tmp.path().join("data/notifications.json.tmp").exists());
        assert_eq!(store.get("notifications").unwrap(), Some(json!([])));
    }

    #[test]
    fn json_directory_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = JsonDirectory::new(tmp.path().to_path_buf());
        assert!(store.get("definitions").unwrap().is_none());
    }

    #[test]
    fn json_directory_reports_malformed_documents() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("definitions.json"), "{ not json").unwrap();
        let store = JsonDirectory::new(tmp.path().to_path_buf());

        let error = store.get("definitions").unwrap_err();

        assert!(matches!(error, StorageError::Json { ref key, .. } if key == "definitions"));
    }
}
