//! Error types for `todo_sync`.

use std::path::PathBuf;

/// Errors that can occur in the synchronization layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encoding or decoding error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A storage location could not be determined on this system.
    #[error("Storage location unavailable: {0}")]
    LocationUnavailable(String),

    /// A probe file read back different contents than were written.
    #[error("Probe mismatch at {0}")]
    ProbeMismatch(PathBuf),

    /// Neither the primary record nor its backup could be loaded.
    #[error("Failed to load, no backup available: {0}")]
    NoBackup(String),

    /// The persistence worker is gone or could not run a job.
    #[error("Persistence worker error: {0}")]
    Worker(String),

    /// The manager was started outside a tokio runtime.
    #[error("No tokio runtime available to run the persistence worker")]
    NoRuntime,

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// A referenced task does not exist.
    #[error("Task not found: {0}")]
    TaskNotFound(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
