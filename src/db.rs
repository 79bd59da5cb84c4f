//! Audit database
//!
//! Append-only log of chat traffic and puzzle outcomes. Chat state itself is
//! never persisted here.

mod schema;

pub use schema::*;

use crate::state_machine::ChatId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock is poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe audit database handle
#[derive(Clone)]
pub struct AuditDb {
    conn: Arc<Mutex<Connection>>,
}

impl AuditDb {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn connection(&self) -> DbResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Append one event
    pub fn append(&self, event: &AuditEvent) -> DbResult<i64> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO audit_log (chat_id, kind, detail, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.chat_id.0,
                event.kind.as_str(),
                event.detail,
                event.at.to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent events for a chat, newest first
    pub fn recent_for_chat(&self, chat_id: ChatId, limit: usize) -> DbResult<Vec<AuditRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, kind, detail, created_at
             FROM audit_log
             WHERE chat_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![chat_id.0, limit], |row| {
            let kind: String = row.get(2)?;
            Ok(AuditRecord {
                id: row.get(0)?,
                chat_id: ChatId(row.get(1)?),
                kind: AuditKind::parse(&kind).unwrap_or(AuditKind::Failure),
                detail: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Total number of stored events
    #[allow(dead_code)] // Used in tests
    pub fn count(&self) -> DbResult<i64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
