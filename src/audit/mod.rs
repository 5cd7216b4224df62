//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every vault operation (init, add, get, search,
//! delete, ...) in a local SQLite database at `<data_dir>/audit.db`.
//! Secret values never reach this table; only labels and users do.
//!
//! Auditing never blocks the vault: if `audit.db` cannot be opened the
//! log is simply absent, and failed inserts are dropped.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use crate::errors::Result;

/// File name of the audit database inside the data directory.
pub const FILE_NAME: &str = "audit.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS audit_log (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    operation TEXT NOT NULL,
    label     TEXT,
    user      TEXT,
    details   TEXT
);";

/// One row of the audit log.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub label: Option<String>,
    pub user: Option<String>,
    pub details: Option<String>,
}

/// Destination for audit events.
///
/// Recording is fire-and-forget: a sink must never fail the operation
/// that produced the event.
pub trait AuditSink {
    fn record(&self, operation: &str, label: Option<&str>, user: Option<&str>, details: Option<&str>);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudit;

impl AuditSink for NoAudit {
    fn record(&self, _: &str, _: Option<&str>, _: Option<&str>, _: Option<&str>) {}
}

/// `None` is "audit logging unavailable".
impl<S: AuditSink> AuditSink for Option<S> {
    fn record(&self, operation: &str, label: Option<&str>, user: Option<&str>, details: Option<&str>) {
        if let Some(sink) = self {
            sink.record(operation, label, user, details);
        }
    }
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open or create `<data_dir>/audit.db`, owner-only. `None` when it
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(data_dir);
        let conn = match Connection::open(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                warn!(path = %db_path.display(), error = %e, "audit log unavailable");
                return None;
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&db_path, std::fs::Permissions::from_mode(0o600));
        }

        if let Err(e) = conn.execute_batch(SCHEMA) {
            warn!(error = %e, "audit log schema could not be created");
            return None;
        }

        Some(Self { conn })
    }

    pub fn log(
        &self,
        operation: &str,
        label: Option<&str>,
        user: Option<&str>,
        details: Option<&str>,
    ) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, label, user, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, label, user, details],
        );
    }

    /// Newest entries first, at most `limit`.  `since` keeps entries at
    /// or after that instant; `operation` keeps one operation, ignoring
    /// case.  Both filters apply before the limit.
    pub fn query(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
        operation: Option<&str>,
    ) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let since = since.map(|t| t.to_rfc3339());

        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, operation, label, user, details
             FROM audit_log
             WHERE (?1 IS NULL OR timestamp >= ?1)
               AND (?3 IS NULL OR operation = ?3 COLLATE NOCASE)
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(rusqlite::params![since, limit, operation], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Path to the audit database inside `data_dir`.
    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join(FILE_NAME)
    }
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let raw: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp,
        operation: row.get(2)?,
        label: row.get(3)?,
        user: row.get(4)?,
        details: row.get(5)?,
    })
}

impl AuditSink for AuditLog {
    fn record(&self, operation: &str, label: Option<&str>, user: Option<&str>, details: Option<&str>) {
        self.log(operation, label, user, details);
    }
}
