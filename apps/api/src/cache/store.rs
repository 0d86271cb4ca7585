//! Storage backends for cached answers.
//!
//! `FileStore` keeps one pretty-printed JSON document per key under the cache
//! directory, so entries survive restarts and can be inspected by hand.
//! `MemoryStore` keeps them in a map, for deployments without a writable disk
//! and for tests.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tempfile::NamedTempFile;
use thiserror::Error;

use super::CacheEntry;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed cache entry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Key-addressed persistence for [`CacheEntry`] records.
///
/// Implementations must tolerate concurrent calls for the same key; the last
/// writer wins.
pub trait EntryStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError>;
    /// Returns `false` if nothing was stored under `key`.
    fn remove(&self, key: &str) -> Result<bool, CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl EntryStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let raw = match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        // Write to a sibling temp file and rename, so readers never observe a
        // half-written document.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), entry)?;
        tmp.as_file_mut().flush()?;
        tmp.persist(self.path_for(&entry.cache_key))
            .map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(entry.cache_key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().cloned().collect())
    }
}
