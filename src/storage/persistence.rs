//! Loading and saving the task collection.
//!
//! The engine owns the record format: the primary record is a JSON array of
//! tasks; timestamps are RFC 3339 with full sub-second precision, so they
//! round-trip exactly. File-based stores also keep a backup of the last good
//! primary, which `load` falls back to when the primary is missing or
//! unreadable.

use crate::error::{Error, Result};
use crate::tasks::{Statistics, Task};
use crate::traits::{Record, RecordStore, RefreshNotifier};
use chrono::Utc;
use std::sync::Arc;

/// What `load` found.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No primary record and no backup: a first run.
    Missing,
    /// The primary record decoded cleanly.
    Loaded(Vec<Task>),
    /// The primary was unusable; the backup was restored and re-saved.
    Recovered {
        /// The restored tasks.
        tasks: Vec<Task>,
        /// Why the primary could not be used.
        cause: String,
    },
    /// Neither primary nor backup could be used. The collection starts empty.
    Failed(Error),
}

impl LoadOutcome {
    /// The tasks to use, empty unless something was loaded.
    #[must_use]
    pub fn into_tasks(self) -> Vec<Task> {
        match self {
            Self::Loaded(tasks) | Self::Recovered { tasks, .. } => tasks,
            Self::Missing | Self::Failed(_) => Vec::new(),
        }
    }

    /// Whether the load ended in an error state.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What a successful `save` did besides writing the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of tasks written.
    pub tasks: usize,
    /// Whether the previous primary was copied to the backup.
    pub backed_up: bool,
    /// Whether the statistics record was written.
    pub statistics_written: bool,
}

/// Serializes tasks to and from a [`RecordStore`].
pub struct PersistenceEngine {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn RefreshNotifier>,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine").field("store", &self.store).finish_non_exhaustive()
    }
}

impl PersistenceEngine {
    /// Create an engine over `store` that signals `notifier` after each save.
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn RefreshNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Load the collection, recovering from the backup if needed.
    ///
    /// This performs blocking I/O.
    pub fn load(&self) -> LoadOutcome {
        let cause = match self.store.read(Record::Tasks) {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(tasks) => {
                    tracing::debug!(count = tasks.len(), "loaded tasks");
                    return LoadOutcome::Loaded(tasks);
                }
                Err(e) => format!("primary record is corrupt: {e}"),
            },
            Ok(None) => {
                if !self.has_backup() {
                    tracing::info!(location = %self.store.location(), "no stored tasks yet");
                    return LoadOutcome::Missing;
                }
                "primary record is missing".to_string()
            }
            Err(e) => format!("primary record is unreadable: {e}"),
        };

        tracing::warn!(%cause, "attempting restore from backup");
        match self.restore_from_backup() {
            Ok(tasks) => LoadOutcome::Recovered { tasks, cause },
            Err(e) => {
                tracing::error!(%cause, error = %e, "failed to load, no backup available");
                LoadOutcome::Failed(Error::NoBackup(format!("{cause}; {e}")))
            }
        }
    }

    /// Save the whole collection.
    ///
    /// The previous primary is backed up first (best effort), then the new
    /// primary is written atomically. Statistics are written afterwards and
    /// may fail without failing the save. The notifier fires once the primary
    /// is durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the tasks cannot be encoded or the primary cannot
    /// be written. The stored data is left as it was.
    pub fn save(&self, tasks: &[Task]) -> Result<SaveReport> {
        let bytes = serde_json::to_vec_pretty(tasks)?;
        let backed_up = self.backup();

        self.store.write(Record::Tasks, &bytes)?;
        tracing::debug!(count = tasks.len(), bytes = bytes.len(), "saved tasks");

        let statistics_written = match self.write_statistics(tasks) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to write statistics");
                false
            }
        };

        self.notifier.data_changed();
        Ok(SaveReport { tasks: tasks.len(), backed_up, statistics_written })
    }

    /// Copy the current primary to the backup record.
    ///
    /// Only a primary that still decodes is copied, so a corrupt file never
    /// replaces a good backup. Returns whether a backup was written.
    fn backup(&self) -> bool {
        if !self.store.supports_backup() {
            return false;
        }
        let bytes = match self.store.read(Record::Tasks) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "could not read primary for backup");
                return false;
            }
        };
        if let Err(e) = decode(&bytes) {
            tracing::warn!(error = %e, "primary is corrupt, keeping existing backup");
            return false;
        }
        match self.store.write(Record::Backup, &bytes) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "backup failed, continuing with save");
                false
            }
        }
    }

    /// Decode the backup and write it back as the primary.
    ///
    /// The backup is not touched, and the notifier fires if the primary was
    /// rewritten. A failed rewrite is logged; the restored tasks are still
    /// returned and the next save retries it.
    fn restore_from_backup(&self) -> Result<Vec<Task>> {
        if !self.store.supports_backup() {
            return Err(Error::NoBackup("storage medium keeps no backup".to_string()));
        }
        let bytes = self
            .store
            .read(Record::Backup)?
            .ok_or_else(|| Error::NoBackup("backup record is missing".to_string()))?;
        let tasks = decode(&bytes)?;

        match self.store.write(Record::Tasks, &bytes) {
            Ok(()) => {
                tracing::info!(count = tasks.len(), "restored tasks from backup");
                self.notifier.data_changed();
            }
            Err(e) => tracing::warn!(error = %e, "restored from backup but could not rewrite primary"),
        }
        Ok(tasks)
    }

    fn has_backup(&self) -> bool {
        self.store.supports_backup() && matches!(self.store.read(Record::Backup), Ok(Some(_)))
    }

    fn write_statistics(&self, tasks: &[Task]) -> Result<()> {
        let stats = Statistics::compute(tasks, Utc::now());
        self.store.write(Record::Statistics, &serde_json::to_vec_pretty(&stats)?)
    }
}

fn decode(bytes: &[u8]) -> Result<Vec<Task>> {
    Ok(serde_json::from_slice(bytes)?)
}
