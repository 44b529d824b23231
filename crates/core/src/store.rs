//! Persistent store seam.
//!
//! The core defines the shape of each persisted blob but not the storage
//! mechanism: anything that can hold named blobs satisfies the contract. Two
//! implementations are provided — an in-memory store for tests and a
//! file-backed store for single-device deployments.
//!
//! Blobs that hold mutable post state are wrapped in a [`Versioned`] envelope.
//! Saves check the stored version stamp and reject stale writes instead of
//! silently last-write-winning when two operator sessions race on the same
//! blob.

use crate::constants::STORE_FILE_EXTENSION;
use crate::{PostError, PostResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Errors that can occur in a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Data directory does not exist and could not be created
    #[error("invalid data directory: {0}")]
    InvalidDataDirectory(String),

    /// Key contains characters or segments the store refuses to map to a path
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,
}

/// A named-blob store.
///
/// Implementations must make `put` atomic per key from the caller's
/// perspective: a concurrent reader sees either the previous blob or the new
/// one, never a mixture.
pub trait Store {
    /// Reads the blob stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes `blob` under `key`, replacing any previous value.
    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, blob)
    }
}

/// In-memory store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

/// File-backed store rooted at a data directory.
///
/// Keys map to `<root>/<key>.json`; `/`-separated key segments become
/// subdirectories. Keys are restricted to a conservative character set so a
/// key can never escape the root.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a file store, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDataDirectory` if the directory cannot be
    /// created or canonicalised.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|e| {
            StoreError::InvalidDataDirectory(format!("cannot create {}: {}", root.display(), e))
        })?;

        let root = root.canonicalize().map_err(|e| {
            StoreError::InvalidDataDirectory(format!(
                "cannot canonicalize {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        path.set_extension(STORE_FILE_EXTENSION);
        Ok(path)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.blob_path(key)?;
        match fs::read(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn put(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, blob)?;
        Ok(())
    }
}

/// Validates that a key is safe to embed in a filesystem path.
///
/// Keys are `/`-separated segments of lowercase alphanumerics, `-` and `_`.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".into()));
    }

    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(StoreError::InvalidKey(format!(
                "key '{}' contains an empty segment",
                key
            )));
        }
        let ok = segment
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'-' | b'_'));
        if !ok {
            return Err(StoreError::InvalidKey(format!(
                "key '{}' contains invalid characters (only lowercase alphanumeric, '-', '_' allowed)",
                key
            )));
        }
    }

    Ok(())
}

/// A version-stamped blob envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub data: T,
}

#[derive(Serialize)]
struct VersionedRef<'a, T> {
    version: u64,
    data: &'a T,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u64,
}

/// Loads a versioned blob from the store.
///
/// Returns `None` when the key is absent (first use of a post/session).
pub fn load_versioned<T, S>(store: &S, key: &str) -> PostResult<Option<Versioned<T>>>
where
    T: DeserializeOwned,
    S: Store,
{
    match store.get(key)? {
        Some(blob) => {
            let envelope =
                serde_json::from_slice(&blob).map_err(PostError::Deserialization)?;
            Ok(Some(envelope))
        }
        None => Ok(None),
    }
}

/// Saves a versioned blob, rejecting the write if the stored version no
/// longer matches the one this session loaded.
///
/// Returns the new version stamp on success.
///
/// # Errors
///
/// Returns [`PostError::StaleWrite`] when another session has written the
/// blob since it was loaded. The caller should reload and reapply.
pub fn save_versioned<T, S>(
    store: &S,
    key: &str,
    data: &T,
    loaded_version: u64,
) -> PostResult<u64>
where
    T: Serialize,
    S: Store,
{
    let stored_version = match store.get(key)? {
        Some(blob) => {
            let probe: VersionProbe =
                serde_json::from_slice(&blob).map_err(PostError::Deserialization)?;
            probe.version
        }
        None => 0,
    };

    if stored_version != loaded_version {
        return Err(PostError::StaleWrite {
            key: key.to_string(),
            stored: stored_version,
            loaded: loaded_version,
        });
    }

    let next_version = loaded_version + 1;
    let envelope = VersionedRef {
        version: next_version,
        data,
    };
    let blob = serde_json::to_vec_pretty(&envelope).map_err(PostError::Serialization)?;
    store.put(key, &blob)?;

    Ok(next_version)
}
