//! `SQLite`-backed key-value record store.
//!
//! This is the medium of last resort. Each record is a single row in a `kv`
//! table keyed by a namespaced string, so the whole task collection lives
//! under one key. There is no backup row: the database's own journal is
//! trusted for durability.
//!
//! Each operation opens a new connection to the database file. This keeps
//! the store `Send + Sync` without a connection pool and is acceptable for
//! the low frequency of saves.

use crate::error::Result;
use crate::traits::{Record, RecordStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite-based key-value store.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    /// Path to the database file.
    db_path: PathBuf,
}

impl KeyValueStore {
    /// Create a store for the given database path.
    ///
    /// Nothing is opened yet; the file and schema are created on first use,
    /// so construction itself cannot fail.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into() }
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection, creating the schema if needed.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            r"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )?;
        Ok(conn)
    }

    /// Read a raw value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or queried.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or written.
    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )?;
        Ok(())
    }
}

impl RecordStore for KeyValueStore {
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>> {
        if record == Record::Backup {
            return Ok(None);
        }
        self.get(record.key())
    }

    fn write(&self, record: Record, bytes: &[u8]) -> Result<()> {
        if record == Record::Backup {
            return Ok(());
        }
        // A single-statement upsert is atomic in SQLite.
        self.set(record.key(), bytes)
    }

    fn supports_backup(&self) -> bool {
        false
    }

    fn location(&self) -> String {
        format!("{} (key {})", self.db_path.display(), Record::Tasks.key())
    }
}
