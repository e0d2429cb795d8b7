// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed security event store
//!
//! Events live in `sf_events_log`. The table is append-only: triggers reject
//! any UPDATE or DELETE, so a reputation score can never shrink.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use gate_core::{EventCode, LedgerStore, SecurityEvent, StorageError, StorageResult};
use rusqlite::params;
use tracing::debug;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sf_events_log (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id TEXT NOT NULL,
  type TEXT NOT NULL,
  message TEXT NOT NULL,
  ip_address TEXT NOT NULL,
  host TEXT NOT NULL,
  points INTEGER NOT NULL DEFAULT 0,
  timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sf_events_log_ip
  ON sf_events_log(ip_address);

CREATE TRIGGER IF NOT EXISTS trg_sf_events_log_no_update
BEFORE UPDATE ON sf_events_log
BEGIN
  SELECT RAISE(FAIL, 'sf_events_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_sf_events_log_no_delete
BEFORE DELETE ON sf_events_log
BEGIN
  SELECT RAISE(FAIL, 'sf_events_log is append-only');
END;
";

/// Ledger store on a dedicated SQLite connection
///
/// The connection is `!Sync`, so it sits behind a mutex; SQLite's own file
/// locking serializes writers across processes.
pub struct SqliteLedgerStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteLedgerStore {
    /// Opens the store at `path` and ensures the events table exists.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = rusqlite::Connection::open(path).map_err(|e| {
            StorageError::ledger(format!("failed to open ledger at {}: {e}", path.display()))
        })?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
            .map_err(|e| StorageError::ledger(format!("failed to configure ledger: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| StorageError::ledger(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: rusqlite::Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StorageError::ledger(format!("failed to apply ledger schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<R>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<R>,
    ) -> StorageResult<R> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::ledger(format!("ledger connection poisoned: {e}")))?;
        f(&conn).map_err(|e| StorageError::ledger(e.to_string()))
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn append(&self, event: &SecurityEvent) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sf_events_log (user_id, type, message, ip_address, host, points, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.user_id,
                    event.event_code.as_str(),
                    event.message,
                    event.ip_address,
                    event.host_name,
                    event.points,
                    event.timestamp.to_rfc3339(),
                ],
            )
        })?;
        debug!(ip = %event.ip_address, code = %event.event_code, "Security event stored");
        Ok(())
    }

    fn total_points(&self, ip_address: &str) -> StorageResult<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(points), 0) FROM sf_events_log WHERE ip_address = ?1",
                params![ip_address],
                |row| row.get(0),
            )
        })
    }

    fn events_for(&self, ip_address: &str) -> StorageResult<Vec<SecurityEvent>> {
        let raw = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, type, message, ip_address, host, points, timestamp
                 FROM sf_events_log WHERE ip_address = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![ip_address], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        raw.into_iter()
            .map(
                |(user_id, code, message, ip_address, host_name, points, timestamp)| {
                    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                        .map_err(|e| {
                            StorageError::ledger(format!("invalid stored timestamp '{timestamp}': {e}"))
                        })?
                        .with_timezone(&Utc);
                    Ok(SecurityEvent {
                        event_code: EventCode::parse(&code),
                        user_id,
                        ip_address,
                        host_name,
                        points,
                        message,
                        timestamp,
                    })
                },
            )
            .collect()
    }
}
