//! Core traits for testability and abstraction.
//!
//! Each seam between the manager and the outside world is a trait here, so
//! tests can swap in the doubles from [`crate::testing`].

use crate::error::Result;
use crate::tasks::TaskDraft;
use std::path::Path;

/// The records the persistence engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Record {
    /// The full task collection.
    Tasks,
    /// The previous good copy of [`Record::Tasks`].
    Backup,
    /// Cached statistics for consumers that do not load tasks.
    Statistics,
}

impl Record {
    /// File name used by file-based stores.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks.json",
            Self::Backup => "tasks.backup.json",
            Self::Statistics => "statistics.json",
        }
    }

    /// Namespaced key used by the key-value store.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tasks => "todo_sync.tasks",
            Self::Backup => "todo_sync.tasks.backup",
            Self::Statistics => "todo_sync.statistics",
        }
    }
}

/// Trait for checking whether a directory is usable storage.
///
/// The production implementation does a real write/read/delete round trip;
/// tests use a scripted mock to simulate unavailable mediums.
pub trait MediumProbe: Send + Sync {
    /// Check that `dir` can be created, written, read back and cleaned up.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the directory is unusable.
    fn probe(&self, dir: &Path) -> Result<()>;
}

/// Trait for a medium holding the named records.
///
/// Implementations must make [`RecordStore::write`] atomic: a concurrent
/// reader sees either the old contents or the new ones, never a mix.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Read a record. Returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>>;

    /// Replace a record atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous contents stay intact.
    fn write(&self, record: Record, bytes: &[u8]) -> Result<()>;

    /// Whether this medium keeps a separate [`Record::Backup`].
    fn supports_backup(&self) -> bool;

    /// Human-readable location for diagnostics.
    fn location(&self) -> String;
}

/// Trait for telling out-of-process observers that stored data changed.
///
/// Called exactly once after each durable save. Implementations must not
/// block for long and must not fail the save; they log their own errors.
pub trait RefreshNotifier: Send + Sync {
    /// Signal that the persisted collection changed.
    fn data_changed(&self);
}

/// Trait for supplying first-run content.
///
/// Asked once, after the first load, if the collection is empty.
pub trait SeedProvider: Send + Sync {
    /// Drafts to create in an empty collection.
    fn seed(&self) -> Vec<TaskDraft>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_names_are_distinct() {
        let records = [Record::Tasks, Record::Backup, Record::Statistics];
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                assert_ne!(a.file_name(), b.file_name());
                assert_ne!(a.key(), b.key());
            }
        }
    }

    #[test]
    fn test_keys_are_namespaced() {
        assert!(Record::Tasks.key().starts_with("todo_sync."));
        assert!(Record::Statistics.key().starts_with("todo_sync."));
    }
}
