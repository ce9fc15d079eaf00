//! Configuration management for todo-sync.
//!
//! Settings live in `<config dir>/todo-sync/config.yaml`. Every field has a
//! default, so a missing or partial file is fine.

use crate::error::{Error, Result};
use crate::paths;
use crate::storage::selector::StorageLocations;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which of the two cooperating processes this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRole {
    /// The main application.
    #[default]
    App,
    /// The home-screen widget extension.
    Widget,
}

impl ProcessRole {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Widget => "widget",
        }
    }
}

impl std::fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Longest accepted widget refresh interval: one week.
pub const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;

/// Widget refresh policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WidgetConfig {
    /// Refresh interval when something is overdue or due today.
    pub urgent_refresh_minutes: u64,
    /// Refresh interval otherwise.
    pub default_refresh_minutes: u64,
    /// Maximum number of tasks handed to the widget.
    pub task_limit: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self { urgent_refresh_minutes: 15, default_refresh_minutes: 60, task_limit: 5 }
    }
}

impl WidgetConfig {
    /// The urgent interval as a `Duration`.
    #[must_use]
    pub const fn urgent_refresh(&self) -> Duration {
        Duration::from_secs(self.urgent_refresh_minutes.saturating_mul(60))
    }

    /// The default interval as a `Duration`.
    #[must_use]
    pub const fn default_refresh(&self) -> Duration {
        Duration::from_secs(self.default_refresh_minutes.saturating_mul(60))
    }
}

/// Settings for one process's synchronization layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Identifier of the shared container both processes belong to.
    pub app_group: String,

    /// Which process this configuration is for.
    pub process: ProcessRole,

    /// Explicit shared container root, instead of the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_container: Option<PathBuf>,

    /// Explicit private documents root, instead of the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_documents: Option<PathBuf>,

    /// Explicit key-value database path, instead of the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_value_db: Option<PathBuf>,

    /// Ask the seed provider for content when the first load is empty.
    pub seed_if_empty: bool,

    /// Widget refresh policy.
    pub widget: WidgetConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            app_group: "group.todo-sync".to_string(),
            process: ProcessRole::App,
            shared_container: None,
            private_documents: None,
            key_value_db: None,
            seed_if_empty: false,
            widget: WidgetConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Default configuration for the given process.
    #[must_use]
    pub fn for_process(process: ProcessRole) -> Self {
        Self { process, ..Self::default() }
    }

    /// Load config from the default location, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// platform has no config directory.
    pub fn load() -> Result<Option<Self>> {
        let path = paths::config_path()
            .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?;
        Self::load_from(&path)
    }

    /// Load config from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Save config to a specific file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.app_group.trim().is_empty() {
            return Err(Error::Config("app_group must not be empty".into()));
        }
        if self.widget.urgent_refresh_minutes == 0 || self.widget.default_refresh_minutes == 0 {
            return Err(Error::Config("widget refresh intervals must be positive".into()));
        }
        if self.widget.urgent_refresh_minutes > MAX_REFRESH_MINUTES
            || self.widget.default_refresh_minutes > MAX_REFRESH_MINUTES
        {
            return Err(Error::Config(format!(
                "widget refresh intervals must be at most {MAX_REFRESH_MINUTES} minutes"
            )));
        }
        Ok(())
    }

    /// Resolve the candidate storage locations for this process.
    ///
    /// Explicit fields win over environment overrides, which win over
    /// platform defaults.
    #[must_use]
    pub fn locations(&self) -> StorageLocations {
        let process = self.process.as_str();
        StorageLocations {
            shared_container: self
                .shared_container
                .clone()
                .or_else(|| paths::shared_container_dir(&self.app_group)),
            private_documents: self
                .private_documents
                .as_ref()
                .map(|root| root.join(process))
                .or_else(|| paths::private_documents_dir(process)),
            key_value_db: self.key_value_db.clone().unwrap_or_else(|| paths::key_value_path(process)),
        }
    }
}
