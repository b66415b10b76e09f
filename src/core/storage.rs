//! Opaque key-value blob storage.
//!
//! Everything the monitor remembers between runs is a JSON string stored
//! under one of a few fixed keys. The file-backed store namespaces them with
//! a prefix inside the user data directory.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, SmartBinError};

/// Namespace prefix applied to every stored key
pub const NAMESPACE: &str = "smartbin";

pub const KEY_DB: &str = "db";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_LOGS: &str = "logs";
pub const KEY_HISTORY: &str = "history";

pub const ALL_KEYS: [&str; 4] = [KEY_DB, KEY_SETTINGS, KEY_LOGS, KEY_HISTORY];

/// Minimal key-value store for serialized blobs
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<prefix>.<key>.json` inside one directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
    prefix: String,
}

impl FileBlobStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            prefix: NAMESPACE.to_string(),
        }
    }

    /// Store rooted at the platform data directory (`~/.local/share/smartbin`
    /// on Linux, `%APPDATA%\smartbin` on Windows)
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?))
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SmartBinError::storage("Could not determine data directory"))?;
        Ok(data_dir.join(NAMESPACE))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.json", self.prefix, key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write to a sibling file first so a crash never leaves half a blob
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
