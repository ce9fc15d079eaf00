//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.
//! Unlike production code they are free to panic on misuse.

#![allow(dead_code)]

use crate::config::{ProcessRole, SyncConfig};
use crate::error::{Error, Result};
use crate::storage::selector::FsProbe;
use crate::tasks::TaskDraft;
use crate::traits::{MediumProbe, Record, RecordStore, RefreshNotifier, SeedProvider};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A configuration whose every storage location lives under `root`.
///
/// Both roles built from the same root share the container but get their
/// own private directory and key-value database.
#[must_use]
pub fn isolated_config(root: &Path, process: ProcessRole) -> SyncConfig {
    SyncConfig {
        process,
        shared_container: Some(root.join("shared")),
        private_documents: Some(root.join("private")),
        key_value_db: Some(root.join("kv").join(format!("{process}.sqlite3"))),
        ..SyncConfig::default()
    }
}

/// A probe that fails for chosen directories and probes the rest for real.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    failing: Mutex<HashSet<PathBuf>>,
    fail_all: AtomicBool,
    probed: Mutex<Vec<PathBuf>>,
}

impl ScriptedProbe {
    /// A probe that behaves like [`FsProbe`] until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A probe that rejects each of `dirs`.
    #[must_use]
    pub fn failing_for(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let probe = Self::new();
        probe.failing.lock().extend(dirs);
        probe
    }

    /// A probe that rejects every directory.
    #[must_use]
    pub fn always_failing() -> Self {
        let probe = Self::new();
        probe.fail_all.store(true, Ordering::SeqCst);
        probe
    }

    /// Start or stop rejecting `dir`.
    pub fn set_failing(&self, dir: impl Into<PathBuf>, failing: bool) {
        let dir = dir.into();
        let mut set = self.failing.lock();
        if failing {
            set.insert(dir);
        } else {
            set.remove(&dir);
        }
    }

    /// Start or stop rejecting everything.
    pub fn set_fail_all(&self, fail_all: bool) {
        self.fail_all.store(fail_all, Ordering::SeqCst);
    }

    /// Every directory probed so far, in order.
    #[must_use]
    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().clone()
    }
}

impl MediumProbe for ScriptedProbe {
    fn probe(&self, dir: &Path) -> Result<()> {
        self.probed.lock().push(dir.to_path_buf());
        if self.fail_all.load(Ordering::SeqCst) || self.failing.lock().contains(dir) {
            return Err(Error::LocationUnavailable(format!("scripted failure for {}", dir.display())));
        }
        FsProbe.probe(dir)
    }
}

/// An in-memory record store whose reads and writes can be made to fail.
#[derive(Debug)]
pub struct FlakyRecordStore {
    records: Mutex<HashMap<Record, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing_records: Mutex<HashSet<Record>>,
    supports_backup: bool,
    writes: AtomicUsize,
}

impl Default for FlakyRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlakyRecordStore {
    /// An empty store that keeps backups like a file store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            failing_records: Mutex::new(HashSet::new()),
            supports_backup: true,
            writes: AtomicUsize::new(0),
        }
    }

    /// An empty store with no backup record, like the key-value store.
    #[must_use]
    pub fn without_backup() -> Self {
        Self { supports_backup: false, ..Self::new() }
    }

    /// Make every read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes to one record fail.
    pub fn fail_record(&self, record: Record, fail: bool) {
        let mut set = self.failing_records.lock();
        if fail {
            set.insert(record);
        } else {
            set.remove(&record);
        }
    }

    /// Set a record directly, bypassing failure injection.
    pub fn put(&self, record: Record, bytes: impl Into<Vec<u8>>) {
        self.records.lock().insert(record, bytes.into());
    }

    /// Delete a record directly, as another process might.
    pub fn remove(&self, record: Record) {
        self.records.lock().remove(&record);
    }

    /// Get a record directly, bypassing failure injection.
    #[must_use]
    pub fn get(&self, record: Record) -> Option<Vec<u8>> {
        self.records.lock().get(&record).cloned()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RecordStore for FlakyRecordStore {
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("injected read failure").into());
        }
        if record == Record::Backup && !self.supports_backup {
            return Ok(None);
        }
        Ok(self.get(record))
    }

    fn write(&self, record: Record, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing_records.lock().contains(&record) {
            return Err(std::io::Error::other("injected write failure").into());
        }
        if record == Record::Backup && !self.supports_backup {
            return Ok(());
        }
        self.put(record, bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn supports_backup(&self) -> bool {
        self.supports_backup
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// A notifier that counts calls.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: AtomicUsize,
}

impl RecordingNotifier {
    /// Create a notifier with a zero count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `data_changed` was called.
    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RefreshNotifier for RecordingNotifier {
    fn data_changed(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A seed provider returning fixed titles.
#[derive(Debug, Default)]
pub struct FixedSeed {
    titles: Vec<String>,
    calls: AtomicUsize,
}

impl FixedSeed {
    /// Seed with the given titles. Blank titles are skipped.
    #[must_use]
    pub fn new<S: Into<String>>(titles: impl IntoIterator<Item = S>) -> Self {
        Self { titles: titles.into_iter().map(Into::into).collect(), calls: AtomicUsize::new(0) }
    }

    /// Number of times the provider was asked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SeedProvider for FixedSeed {
    fn seed(&self) -> Vec<TaskDraft> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles.iter().filter_map(|t| TaskDraft::new(t.as_str()).ok()).collect()
    }
}
