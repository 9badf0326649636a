//! JSON-file backed aggregate store.
//!
//! The file holds one [`DurableAggregate`] object:
//!
//! ```json
//! { "keys": { "d: a": 12 }, "words": { "the": 4 }, "commands": { "⌘C": 2 }, "clicks": 7 }
//! ```
//!
//! Every merge re-reads the file, adds the deltas, and replaces the file via a
//! uniquely named sibling temp file that is synced to disk before the
//! `rename`, so a crash mid-write leaves either the old or the new aggregate
//! on disk, never a torn one.  An existing but empty file is rejected rather
//! than read as a fresh aggregate.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use keytally_core::{AggregateStore, Category, DurableAggregate, StoreError};
use thiserror::Error;
use tracing::{debug, info};

/// Failures of the JSON statistics file.
#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("I/O error accessing stats file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stats file {path} is not a valid aggregate: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize aggregate: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<FileStoreError> for StoreError {
    fn from(e: FileStoreError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// [`AggregateStore`] persisting to a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the aggregate; a missing file is an empty aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::Io`] for read failures other than "not found"
    /// and [`FileStoreError::Parse`] for malformed or empty content.
    pub fn read(&self) -> Result<DurableAggregate, FileStoreError> {
        match fs::read_to_string(&self.path) {
            // An empty file is a lost write, not a fresh aggregate.
            Ok(content) => serde_json::from_str(&content).map_err(|source| FileStoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stats file yet, starting empty");
                Ok(DurableAggregate::default())
            }
            Err(source) => Err(FileStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Atomically replaces the file with `aggregate`.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::Io`] if the directory, temp file, sync or
    /// rename fails.  The temp file is removed on failure.  The temp file is
    /// synced before the rename and the directory after it, so the renamed
    /// file is never empty after a power loss.
    pub fn write(&self, aggregate: &DurableAggregate) -> Result<(), FileStoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let created = !dir.exists();
        fs::create_dir_all(&dir).map_err(|source| FileStoreError::Io {
            path: dir.clone(),
            source,
        })?;
        if created {
            info!(dir = %dir.display(), "created stats directory");
        }

        let content =
            serde_json::to_string_pretty(aggregate).map_err(FileStoreError::Serialize)?;
        let tmp = dir.join(format!(".stats-{}.tmp", uuid::Uuid::new_v4()));
        if let Err(source) = write_synced(&tmp, content.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(FileStoreError::Io { path: tmp, source });
        }
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(FileStoreError::Io {
                path: self.path.clone(),
                source,
            });
        }
        sync_dir(&dir).map_err(|source| FileStoreError::Io { path: dir, source })
    }

    fn update(&self, apply: impl FnOnce(&mut DurableAggregate)) -> Result<(), FileStoreError> {
        let mut aggregate = self.read()?;
        apply(&mut aggregate);
        self.write(&aggregate)
    }
}

/// Writes `bytes` to a new file at `path` and flushes it to disk.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Persists directory entries (the rename) on platforms that support it.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl AggregateStore for JsonFileStore {
    fn merge_counts(
        &mut self,
        category: Category,
        deltas: &HashMap<String, u64>,
    ) -> Result<(), StoreError> {
        self.update(|aggregate| aggregate.merge_counts(category, deltas))?;
        debug!(%category, entries = deltas.len(), "merged into stats file");
        Ok(())
    }

    fn merge_clicks(&mut self, delta: u64) -> Result<(), StoreError> {
        self.update(|aggregate| aggregate.merge_clicks(delta))?;
        Ok(())
    }

    fn load(&self) -> Result<DurableAggregate, StoreError> {
        Ok(self.read()?)
    }
}
