//! Telling the other process that stored tasks changed.
//!
//! The app writes a stamp file into the shared root after every durable save;
//! the widget host polls it with a [`RefreshWatcher`]. Within one process a
//! [`ChannelNotifier`] does the same job over a watch channel.

use crate::storage::file::write_atomic;
use crate::traits::RefreshNotifier;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// File name of the refresh stamp inside a storage root.
pub const STAMP_FILENAME: &str = "widget-refresh.stamp";

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl RefreshNotifier for NoopNotifier {
    fn data_changed(&self) {}
}

/// Writes the current time to a stamp file on every change.
#[derive(Debug, Clone)]
pub struct StampFileNotifier {
    path: PathBuf,
}

impl StampFileNotifier {
    /// Notifier writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Notifier writing the standard stamp file inside `root`.
    #[must_use]
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(STAMP_FILENAME))
    }

    /// The stamp file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RefreshNotifier for StampFileNotifier {
    fn data_changed(&self) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        match write_atomic(&self.path, stamp.as_bytes()) {
            Ok(()) => tracing::debug!(path = %self.path.display(), %stamp, "refresh stamp written"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to write refresh stamp"),
        }
    }
}

/// Read the time recorded in a stamp file, if any.
#[must_use]
pub fn read_stamp(path: &Path) -> Option<DateTime<Utc>> {
    let content = std::fs::read_to_string(path).ok()?;
    DateTime::parse_from_rfc3339(content.trim()).ok().map(|t| t.with_timezone(&Utc))
}

/// Polls a stamp file for changes.
#[derive(Debug, Clone)]
pub struct RefreshWatcher {
    path: PathBuf,
    last_seen: Option<DateTime<Utc>>,
}

impl RefreshWatcher {
    /// Start watching `path`. The current stamp, if any, counts as seen.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_seen = read_stamp(&path);
        Self { path, last_seen }
    }

    /// Watch the standard stamp file inside `root`.
    #[must_use]
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(STAMP_FILENAME))
    }

    /// The most recent stamp observed.
    #[must_use]
    pub const fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Check once. Returns true if a stamp newer than the last one appeared.
    pub fn poll(&mut self) -> bool {
        let Some(stamp) = read_stamp(&self.path) else {
            return false;
        };
        if self.last_seen.is_some_and(|seen| stamp <= seen) {
            return false;
        }
        self.last_seen = Some(stamp);
        true
    }

    /// Poll every `interval` until a new stamp appears.
    pub async fn changed(&mut self, interval: Duration) {
        while !self.poll() {
            tokio::time::sleep(interval).await;
        }
    }
}

/// In-process notifier backed by a watch channel carrying a generation count.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: watch::Sender<u64>,
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelNotifier {
    /// Create a notifier at generation zero.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Receive generation updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Number of changes signalled so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl RefreshNotifier for ChannelNotifier {
    fn data_changed(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }
}
