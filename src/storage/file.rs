//! Directory-backed record store.
//!
//! Each record is one JSON file under the store's root. Writes go to a
//! temporary file in the same directory, are synced, then renamed over the
//! target, so a reader in another process never sees a half-written file.

use crate::error::Result;
use crate::traits::{Record, RecordStore};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Distinguishes temp files written concurrently from one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A record store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a record.
    #[must_use]
    pub fn path_of(&self, record: Record) -> PathBuf {
        self.root.join(record.file_name())
    }
}

impl RecordStore for FileRecordStore {
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_of(record)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, record: Record, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.path_of(record), bytes)
    }

    fn supports_backup(&self) -> bool {
        true
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// Replace `path` with `bytes` atomically (temp file, fsync, rename).
///
/// On failure the temp file is removed and `path` keeps its old contents.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any step fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp_path = temp_path_for(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().map_or_else(|| "record".into(), |n| n.to_string_lossy());
    let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{unique}.tmp", std::process::id()))
}
