//! Durable SQLite cache tier.
//!
//! Unordered key→value store that survives restarts. Single connection
//! behind a mutex; last-write-wins per key is all the worker needs.

use crate::cache::normalize::normalize_key;
use crate::error::{ClipglotError, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One persisted translation, as returned by the history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTranslation {
    pub key: String,
    pub value: String,
    pub created_at: i64,
}

/// SQLite-backed translation store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| ClipglotError::Store {
            message: format!("failed to open {}: {e}", path.display()),
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at INTEGER
            )",
            [],
        )
        .map_err(|e| ClipglotError::Store {
            message: format!("failed to create schema: {e}"),
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ClipglotError::Store {
            message: format!("failed to open in-memory store: {e}"),
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at INTEGER
            )",
            [],
        )
        .map_err(|e| ClipglotError::Store {
            message: format!("failed to create schema: {e}"),
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Look up a translation by its source text.
    pub fn get(&self, text: &str) -> Result<Option<String>> {
        let key = normalize_key(text);
        let conn = self.lock();

        let mut stmt = conn
            .prepare("SELECT value FROM translations WHERE key = ?1")
            .map_err(store_err)?;
        let mut rows = stmt.query([&key]).map_err(store_err)?;

        match rows.next().map_err(store_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(store_err)?)),
            None => Ok(None),
        }
    }

    /// Store a translation. Last write wins per key.
    pub fn set(&self, text: &str, value: &str) -> Result<()> {
        let key = normalize_key(text);
        let ts = unix_seconds();
        let conn = self.lock();

        conn.execute(
            "INSERT OR REPLACE INTO translations (key, value, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, ts],
        )
        .map_err(store_err)?;

        Ok(())
    }

    /// Most recent translations, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredTranslation>> {
        let conn = self.lock();

        let mut stmt = conn
            .prepare(
                "SELECT key, value, created_at FROM translations
                 ORDER BY created_at DESC LIMIT ?1",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(StoredTranslation {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    created_at: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })
            .map_err(store_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(store_err)?);
        }
        Ok(entries)
    }

    /// Number of stored translations.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as usize)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn store_err(e: rusqlite::Error) -> ClipglotError {
    ClipglotError::Store {
        message: e.to_string(),
    }
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
