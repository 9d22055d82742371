//! Key-Value Namespace Infrastructure
//!
//! A persistent string-to-string namespace with `get`/`set`/`remove`/`clear`.
//! Callers that need structure serialize it themselves (usually JSON).

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

/// Suffix for in-flight writes; never a valid key because of the leading dot
const TEMP_SUFFIX: &str = ".tmp";

/// Key-value error
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Key is empty, starts with `.`, or has characters outside `[A-Za-z0-9_.-]`
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Stored bytes are not UTF-8
    #[error("Value for key {key:?} is not valid UTF-8")]
    InvalidUtf8 { key: String },

    /// Underlying I/O failure
    #[error("Key-value I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KvResult<T> = Result<T, KvError>;

/// Trait for key-value namespace backends
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Make the namespace usable (create directories, etc.)
    async fn ensure_ready(&self) -> KvResult<()>;

    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> KvResult<()>;

    /// Delete every key in the namespace
    async fn clear(&self) -> KvResult<()>;
}

/// Check that a key is safe to use as a file name
pub fn validate_key(key: &str) -> KvResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_string()))
    }
}

// ============================================================================
// File-backed namespace
// ============================================================================

/// One file per key inside a directory
///
/// Writes land in a temp file first and are renamed into place, so readers
/// see either the old value or the new one.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> KvResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}{TEMP_SUFFIX}"))
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn ensure_ready(&self) -> KvResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tracing::debug!(dir = %self.dir.display(), "Key-value namespace ready");
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes).map(Some).map_err(|_| KvError::InvalidUtf8 {
                key: key.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let path = self.path_for(key)?;
        let temp = self.temp_path_for(key);

        tokio::fs::write(&temp, value.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> KvResult<()> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        tracing::info!(dir = %self.dir.display(), removed, "Cleared key-value namespace");
        Ok(())
    }
}

// ============================================================================
// In-memory namespace
// ============================================================================

/// Process-local namespace (tests, ephemeral runs)
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn ensure_ready(&self) -> KvResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        validate_key(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        validate_key(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> KvResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
