//! SQLite-backed durable store.

use super::DurableStore;
use crate::error::LedgerResult;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::time::Duration;

/// How long a connection waits on another process's lock before a read
/// or write gives up with `SQLITE_BUSY`.
const BUSY_WAIT: Duration = Duration::from_secs(5);

pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Ledger database at `path`. Accepts `file:` URIs, so several
    /// connections can share one named in-memory database.
    pub fn open(path: &str) -> LedgerResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(BUSY_WAIT)?;
        // Memory databases report "memory" here and keep their journal.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Self::with_schema(conn)
    }

    /// Throwaway database private to this connection.
    pub fn in_memory() -> LedgerResult<Self> {
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> LedgerResult<Self> {
        let kv = Self { conn };
        kv.migrate()?;
        Ok(kv)
    }

    /// Create the `kv_store` table if this database lacks it.
    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_kv_store.sql"))?;
        Ok(())
    }

    /// When `key` was last written (RFC 3339), if ever.
    pub fn updated_at(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl DurableStore for SqliteKv {
    fn read(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        // Single upsert statement: the row is replaced whole or not at all.
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
