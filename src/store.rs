use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};

use crate::app_dirs::AppDirs;
use crate::session::format_clock;

pub const COMPLETED_KEY: &str = "escapeRoomCompleted";
pub const TIME_KEY: &str = "escapeRoomTime";
pub const ATTEMPTS_KEY: &str = "escapeRoomAttempts";

/// What a finished session leaves behind for the next launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub elapsed_secs: u64,
    pub attempts: Option<u32>,
}

impl fmt::Display for CompletionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last escape: {}", format_clock(self.elapsed_secs))?;
        match self.attempts {
            Some(1) => write!(f, " in 1 attempt"),
            Some(n) => write!(f, " in {} attempts", n),
            None => Ok(()),
        }
    }
}

/// One write inside a [`FlagStore::write_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagWrite {
    Set(&'static str, String),
    Remove(&'static str),
}

/// Last-write-wins string key/value persistence.
pub trait FlagStore {
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()>;
    fn get(&self, key: &str) -> crate::Result<Option<String>>;
    fn remove(&mut self, key: &str) -> crate::Result<()>;

    /// Applies every write or none of them. The default is only as atomic as
    /// the individual writes.
    fn write_batch(&mut self, writes: &[FlagWrite]) -> crate::Result<()> {
        for write in writes {
            match write {
                FlagWrite::Set(key, value) => self.set(key, value)?,
                FlagWrite::Remove(key) => self.remove(key)?,
            }
        }
        Ok(())
    }
}

const UPSERT_FLAG: &str = r#"
    INSERT INTO flags (key, value, updated_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;
const DELETE_FLAG: &str = "DELETE FROM flags WHERE key = ?1";

/// SQLite-backed flag store
#[derive(Debug)]
pub struct SqliteFlagStore {
    conn: Connection,
}

impl SqliteFlagStore {
    /// Open the store at the default state path, creating it if needed
    pub fn open_default() -> crate::Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("lockbox_flags.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> crate::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> crate::Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS flags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl FlagStore for SqliteFlagStore {
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.conn
            .execute(UPSERT_FLAG, params![key, value, Local::now().to_rfc3339()])?;
        Ok(())
    }

    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM flags WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        self.conn.execute(DELETE_FLAG, [key])?;
        Ok(())
    }

    fn write_batch(&mut self, writes: &[FlagWrite]) -> crate::Result<()> {
        let tx = self.conn.transaction()?;
        let now = Local::now().to_rfc3339();

        for write in writes {
            match write {
                FlagWrite::Set(key, value) => tx.execute(UPSERT_FLAG, params![*key, value, now])?,
                FlagWrite::Remove(key) => tx.execute(DELETE_FLAG, [*key])?,
            };
        }

        tx.commit()?;
        Ok(())
    }
}

/// Process-local store, used when the database cannot be opened and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryFlagStore {
    values: HashMap<String, String>,
}

impl FlagStore for MemoryFlagStore {
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

pub fn persist_completion(store: &mut dyn FlagStore, record: &CompletionRecord) -> crate::Result<()> {
    let attempts = match record.attempts {
        Some(attempts) => FlagWrite::Set(ATTEMPTS_KEY, attempts.to_string()),
        None => FlagWrite::Remove(ATTEMPTS_KEY),
    };
    store.write_batch(&[
        FlagWrite::Set(COMPLETED_KEY, "true".to_string()),
        FlagWrite::Set(TIME_KEY, record.elapsed_secs.to_string()),
        attempts,
    ])
}

pub fn clear_completion(store: &mut dyn FlagStore) -> crate::Result<()> {
    store.write_batch(&[
        FlagWrite::Remove(COMPLETED_KEY),
        FlagWrite::Remove(TIME_KEY),
        FlagWrite::Remove(ATTEMPTS_KEY),
    ])
}

/// Reads a previous completion. Unparseable values count as absent.
pub fn load_completion(store: &dyn FlagStore) -> crate::Result<Option<CompletionRecord>> {
    if store.get(COMPLETED_KEY)?.as_deref() != Some("true") {
        return Ok(None);
    }
    let Some(elapsed_secs) = store.get(TIME_KEY)?.and_then(|v| v.parse().ok()) else {
        return Ok(None);
    };
    let attempts = store.get(ATTEMPTS_KEY)?.and_then(|v| v.parse().ok());
    Ok(Some(CompletionRecord {
        elapsed_secs,
        attempts,
    }))
}
