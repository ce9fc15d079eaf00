//! Storage backend selection.
//!
//! At startup each process probes the candidate mediums in priority order and
//! commits to the first one it can actually write to. The choice holds for
//! the life of the process unless a caller explicitly asks to re-probe.
//!
//! The app and the widget run this independently. If one of them cannot reach
//! the shared container it will quietly fall back to storage the other
//! process cannot see; [`SelectedBackend::can_sync_with_widget`] and
//! [`SelectedBackend::diagnostics`] make that divergence visible.

use crate::error::{Error, Result};
use crate::storage::file::FileRecordStore;
use crate::storage::kv::KeyValueStore;
use crate::traits::{MediumProbe, RecordStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the throwaway file written by [`FsProbe`].
const PROBE_FILENAME: &str = ".todo-sync-probe";

/// The storage medium a process committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageStrategy {
    /// Directory shared by the app and the widget.
    SharedContainer,
    /// Directory private to this process.
    PrivateDocuments,
    /// Per-process key-value database.
    KeyValue,
}

impl StorageStrategy {
    /// Get the string representation of the strategy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SharedContainer => "shared-container",
            Self::PrivateDocuments => "private-documents",
            Self::KeyValue => "key-value",
        }
    }

    /// Parse a strategy from its string form (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string names no strategy.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> std::result::Result<Self, InvalidStrategy> {
        match s.trim().to_lowercase().as_str() {
            "shared-container" => Ok(Self::SharedContainer),
            "private-documents" => Ok(Self::PrivateDocuments),
            "key-value" => Ok(Self::KeyValue),
            _ => Err(InvalidStrategy(s.to_string())),
        }
    }

    /// Whether data written with this strategy is visible to the other process.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::SharedContainer)
    }
}

impl std::fmt::Display for StorageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid strategy string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStrategy(pub String);

impl std::fmt::Display for InvalidStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid storage strategy: '{}' (must be one of: shared-container, private-documents, key-value)",
            self.0
        )
    }
}

impl std::error::Error for InvalidStrategy {}

/// Candidate locations, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocations {
    /// Shared container root, if the platform provides one.
    pub shared_container: Option<PathBuf>,
    /// Private documents root for this process, if any.
    pub private_documents: Option<PathBuf>,
    /// Key-value database file. Always present.
    pub key_value_db: PathBuf,
}

/// Why a medium was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    /// The medium that was tried.
    pub strategy: StorageStrategy,
    /// What went wrong.
    pub reason: String,
}

/// The outcome of a selection.
#[derive(Debug, Clone)]
pub struct SelectedBackend {
    strategy: StorageStrategy,
    root: Option<PathBuf>,
    key_value_db: PathBuf,
    failures: Vec<ProbeFailure>,
}

impl SelectedBackend {
    /// A backend committed without probing, for a store supplied by the caller.
    #[must_use]
    pub fn assumed(strategy: StorageStrategy, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let root = (strategy != StorageStrategy::KeyValue).then(|| location.clone());
        Self { strategy, root, key_value_db: location, failures: Vec::new() }
    }

    /// The committed strategy.
    #[must_use]
    pub const fn strategy(&self) -> StorageStrategy {
        self.strategy
    }

    /// Root directory for file strategies, `None` for the key-value store.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Where the records live: the root directory or the database file.
    #[must_use]
    pub fn location(&self) -> &Path {
        self.root.as_deref().unwrap_or(&self.key_value_db)
    }

    /// Mediums that were tried and rejected before this one.
    #[must_use]
    pub fn failures(&self) -> &[ProbeFailure] {
        &self.failures
    }

    /// Whether the other process can see this process's writes.
    #[must_use]
    pub const fn can_sync_with_widget(&self) -> bool {
        self.strategy.is_shared()
    }

    /// Whether every probed medium failed and the last resort was used.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.strategy == StorageStrategy::KeyValue
    }

    /// One-line description for logs and settings screens.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        let mut out = format!("storage: {} at {}", self.strategy, self.location().display());
        if self.can_sync_with_widget() {
            out.push_str("; shared with widget");
        } else {
            out.push_str("; NOT shared with widget");
        }
        for failure in &self.failures {
            out.push_str(&format!("; {} unavailable: {}", failure.strategy, failure.reason));
        }
        out
    }

    /// Open the record store for the committed medium.
    #[must_use]
    pub fn open_store(&self) -> Arc<dyn RecordStore> {
        match &self.root {
            Some(root) => Arc::new(FileRecordStore::new(root.clone())),
            None => Arc::new(KeyValueStore::new(self.key_value_db.clone())),
        }
    }
}

/// Probe that does a real write/read/delete round trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl MediumProbe for FsProbe {
    fn probe(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let nonce = uuid::Uuid::new_v4();
        let path = dir.join(format!("{PROBE_FILENAME}-{nonce}"));
        let token = format!("probe {} {nonce}", std::process::id());

        std::fs::write(&path, token.as_bytes())?;
        let read_back = std::fs::read(&path);
        let removed = std::fs::remove_file(&path);

        if read_back? != token.as_bytes() {
            return Err(Error::ProbeMismatch(path));
        }
        removed?;
        Ok(())
    }
}

/// Chooses a storage medium for this process.
pub struct BackendSelector {
    locations: StorageLocations,
    probe: Arc<dyn MediumProbe>,
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSelector").field("locations", &self.locations).finish_non_exhaustive()
    }
}

impl BackendSelector {
    /// Create a selector that probes with the real filesystem.
    #[must_use]
    pub fn new(locations: StorageLocations) -> Self {
        Self::with_probe(locations, Arc::new(FsProbe))
    }

    /// Create a selector with a custom probe.
    #[must_use]
    pub fn with_probe(locations: StorageLocations, probe: Arc<dyn MediumProbe>) -> Self {
        Self { locations, probe }
    }

    /// The candidate locations.
    #[must_use]
    pub const fn locations(&self) -> &StorageLocations {
        &self.locations
    }

    /// Probe the mediums in priority order and commit to the first usable one.
    ///
    /// Never fails: the key-value store is always accepted as a last resort.
    /// This performs blocking I/O.
    #[must_use]
    pub fn select(&self) -> SelectedBackend {
        let mut failures = Vec::new();
        let candidates = [
            (StorageStrategy::SharedContainer, self.locations.shared_container.as_deref()),
            (StorageStrategy::PrivateDocuments, self.locations.private_documents.as_deref()),
        ];

        for (strategy, dir) in candidates {
            let Some(dir) = dir else {
                tracing::warn!(%strategy, "storage location could not be resolved");
                failures.push(ProbeFailure { strategy, reason: "location unavailable".to_string() });
                continue;
            };
            match self.probe.probe(dir) {
                Ok(()) => {
                    tracing::info!(%strategy, root = %dir.display(), "storage backend selected");
                    return self.commit(strategy, Some(dir.to_path_buf()), failures);
                }
                Err(e) => {
                    tracing::warn!(%strategy, root = %dir.display(), error = %e, "storage probe failed");
                    failures.push(ProbeFailure { strategy, reason: e.to_string() });
                }
            }
        }

        tracing::warn!(
            db = %self.locations.key_value_db.display(),
            "file storage unavailable, falling back to key-value store"
        );
        self.commit(StorageStrategy::KeyValue, None, failures)
    }

    fn commit(
        &self,
        strategy: StorageStrategy,
        root: Option<PathBuf>,
        failures: Vec<ProbeFailure>,
    ) -> SelectedBackend {
        SelectedBackend { strategy, root, key_value_db: self.locations.key_value_db.clone(), failures }
    }
}
