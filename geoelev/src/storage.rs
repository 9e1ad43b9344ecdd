//! Archive cache stores.
//!
//! Downloaded tile archives are kept as raw bytes, keyed by filename
//! (`N37W123.hgt.zip`). The engine only ever appends to a store; it never
//! rewrites or deletes an entry.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::filename::ARCHIVE_EXTENSION;

/// Directory name used under `$HOME` when no cache directory is configured.
const DEFAULT_CACHE_DIR_NAME: &str = ".geoelev";

/// Byte-level storage for downloaded archives.
pub trait ArchiveStore: Send {
    /// Read the bytes stored under `filename`.
    fn load(&self, filename: &str) -> io::Result<Vec<u8>>;

    /// Store `bytes` under `filename`.
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()>;

    /// Whether `err`, returned by [`Self::load`], means the entry is absent
    /// (as opposed to a real I/O failure).
    fn is_not_found(&self, err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::NotFound
    }

    /// Whether an entry exists under `filename`.
    fn contains(&self, filename: &str) -> bool;
}

/// Stores archives as flat files in a local directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `$HOME/.geoelev`, or `./.geoelev` when `HOME` is not set.
    pub fn default_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CACHE_DIR_NAME)
    }

    /// The directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted filenames of all tile archives in the store.
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(ARCHIVE_EXTENSION))
            .collect();
        names.sort();
        Ok(names)
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl ArchiveStore for LocalFileStore {
    fn load(&self, filename: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(filename))
    }

    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.path_for(filename), bytes)
    }

    fn contains(&self, filename: &str) -> bool {
        self.path_for(filename).is_file()
    }
}

/// Keeps archives in memory for the lifetime of the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArchiveStore for MemoryStore {
    fn load(&self, filename: &str) -> io::Result<Vec<u8>> {
        self.lock().get(filename).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not in memory store", filename),
            )
        })
    }

    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        self.lock().insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }

    fn contains(&self, filename: &str) -> bool {
        self.lock().contains_key(filename)
    }
}
