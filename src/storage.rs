// Host key-value storage - persistence boundary for the store
//
// Synchronous, string-keyed, string-valued storage scoped to the
// application. Two backends: a shareable in-memory map (two stores over one
// clone model two tabs on the same origin) and a file-per-key backend under
// the user config directory. External changes are not watched here; the
// host loop delivers them to the store as storage-change events.

use crate::error::PersistenceError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Synchronous key-value persistence
pub trait StorageBackend {
    /// Read the value under `key`; `Ok(None)` when absent
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write `value` under `key`, replacing any prior value
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// In-memory storage. Clones share the underlying map, so a second store
/// initialized over a clone observes the same data - the test double for
/// cross-tab persistence.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed storage: one `<key>.json` file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at the given directory (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default storage directory: ~/.config/trellis
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("trellis"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Read(e.to_string())),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| PersistenceError::Write(e.to_string()))?;
        std::fs::write(self.path_for(key), value)
            .map_err(|e| PersistenceError::Write(e.to_string()))
    }
}

/// Open storage at an explicit directory, or the default location
pub fn open_file_storage(dir: Option<&Path>) -> Option<FileStorage> {
    match dir {
        Some(dir) => Some(FileStorage::new(dir)),
        None => FileStorage::default_dir().map(FileStorage::new),
    }
}
