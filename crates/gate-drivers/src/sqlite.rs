// SPDX-License-Identifier: Apache-2.0

//! SQLite Driver
//!
//! Implements the gateway `Connection` capability on top of `rusqlite`.
//!
//! ## SQLite Specifics
//!
//! - SQLite is file-based, so the `database` field of the connect target holds
//!   the file path; `:memory:` opens a private in-memory database
//! - The DSN is ignored: SQLite has no server to reach
//! - Named placeholders may use `:`, `@` or `$`; `?` placeholders bind by position
//!
//! ## Transaction Handling
//!
//! Transactions are plain `BEGIN`/`COMMIT`/`ROLLBACK` on the single owned
//! connection. The gateway guarantees at most one is in flight.

use std::time::Duration;

use gate_core::{
    ConnectTarget, Connection, Connector, EngineError, EngineResult, Row, Statement, Value,
};
use gate_sql::Placeholder;
use rusqlite::types::{Value as SqlValue, ValueRef};
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One open SQLite connection
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Opens (creating if needed) the database file at `path`, or a private
    /// in-memory database for `:memory:`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = if path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(|e| EngineError::connection_failed(format!("Failed to open SQLite '{path}': {e}")))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        Self::open(":memory:")
    }

    /// Runs a batch of SQL outside the gateway, e.g. to create fixtures.
    pub fn execute_batch(&self, sql: &str) -> EngineResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| EngineError::execution_error(e.to_string()))
    }
}

impl Connection for SqliteConnection {
    fn driver_id(&self) -> &'static str {
        "sqlite"
    }

    fn prepare<'c>(&'c self, sql: &str) -> EngineResult<Box<dyn Statement + 'c>> {
        let stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| EngineError::prepare_failed(e.to_string()))?;

        Ok(Box::new(SqliteStatement {
            stmt,
            buffered: Vec::new(),
            row_count: 0,
        }))
    }

    fn begin_transaction(&self) -> EngineResult<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| EngineError::transaction_error(format!("BEGIN failed: {e}")))
    }

    fn commit(&self) -> EngineResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| EngineError::transaction_error(format!("COMMIT failed: {e}")))
    }

    fn rollback(&self) -> EngineResult<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| EngineError::transaction_error(format!("ROLLBACK failed: {e}")))
    }

    fn last_insert_id(&self) -> EngineResult<String> {
        Ok(self.conn.last_insert_rowid().to_string())
    }
}

/// Prepared SQLite statement with its result rows buffered after execution
struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    buffered: Vec<Row>,
    row_count: u64,
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, name: &str, value: &Value) -> EngineResult<()> {
        let index = match Placeholder::parse(name) {
            Some(Placeholder::Positional(index)) => index,
            Some(Placeholder::Named(named)) => self
                .stmt
                .parameter_index(&named)
                .map_err(|e| EngineError::bind_failed(name, e.to_string()))?
                .ok_or_else(|| EngineError::bind_failed(name, "no such placeholder in statement"))?,
            None => return Err(EngineError::bind_failed(name, "invalid parameter name")),
        };

        if index > self.stmt.parameter_count() {
            return Err(EngineError::bind_failed(
                name,
                format!(
                    "position {index} exceeds the {} placeholders of the statement",
                    self.stmt.parameter_count()
                ),
            ));
        }

        self.stmt
            .raw_bind_parameter(index, to_sqlite(value))
            .map_err(|e| EngineError::bind_failed(name, e.to_string()))
    }

    fn execute(&mut self) -> EngineResult<()> {
        self.buffered.clear();

        if self.stmt.column_count() == 0 {
            let changed = self
                .stmt
                .raw_execute()
                .map_err(|e| EngineError::execution_error(e.to_string()))?;
            self.row_count = changed as u64;
            return Ok(());
        }

        let names: Vec<String> = self
            .stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut out = Vec::new();
        let mut rows = self.stmt.raw_query();
        while let Some(row) = rows
            .next()
            .map_err(|e| EngineError::execution_error(e.to_string()))?
        {
            let mut converted = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| EngineError::execution_error(e.to_string()))?;
                converted.push(name.clone(), from_sqlite(value));
            }
            out.push(converted);
        }
        drop(rows);

        debug!(rows = out.len(), "SQLite query buffered");
        self.row_count = out.len() as u64;
        self.buffered = out;
        Ok(())
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }

    fn fetch_all(&mut self) -> EngineResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.buffered))
    }
}

/// Converts a gateway Value to a SQLite value for parameter binding.
fn to_sqlite(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

/// Connector opening SQLite files named by the target's `database` field
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, target: &ConnectTarget) -> EngineResult<Box<dyn Connection>> {
        if !target.options.raise_errors || target.options.emulate_prepares {
            return Err(EngineError::connection_failed(
                "SQLite connections always raise errors and prepare natively",
            ));
        }

        debug!(database = %target.database, "Opening SQLite connection");
        let conn = SqliteConnection::open(&target.database)?;
        Ok(Box::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, a INTEGER, b TEXT);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn insert_reports_changes_and_rowid() {
        let conn = fixture();
        {
            let mut stmt = conn.prepare("INSERT INTO t (a, b) VALUES (:a, :b)").unwrap();
            stmt.bind(":a", &Value::Int(5)).unwrap();
            stmt.bind("b", &Value::from("x")).unwrap();
            stmt.execute().unwrap();
            assert_eq!(stmt.row_count(), 1);
        }
        assert_eq!(conn.last_insert_id().unwrap(), "1");
    }

    #[test]
    fn select_buffers_rows_by_column_name() {
        let conn = fixture();
        conn.execute_batch("INSERT INTO t (a, b) VALUES (5, 'x'), (5, NULL), (6, 'y');")
            .unwrap();

        let mut stmt = conn.prepare("SELECT a, b FROM t WHERE a = ? ORDER BY id").unwrap();
        stmt.bind("1", &Value::Int(5)).unwrap();
        stmt.execute().unwrap();

        assert_eq!(stmt.row_count(), 2);
        let rows = stmt.fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("b"), Some(&Value::from("x")));
        assert_eq!(rows[1].get("b"), Some(&Value::Null));
        assert!(stmt.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn binding_an_unknown_placeholder_fails() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT * FROM t WHERE a = :a").unwrap();
        let err = stmt.bind(":nope", &Value::Int(1)).unwrap_err();
        assert!(matches!(err, EngineError::BindFailed { .. }));

        let err = stmt.bind("2", &Value::Int(1)).unwrap_err();
        assert!(matches!(err, EngineError::BindFailed { .. }));
    }

    #[test]
    fn prepare_reports_syntax_errors() {
        let conn = fixture();
        let err = conn.prepare("SELEC nonsense").err().unwrap();
        assert!(matches!(err, EngineError::PrepareFailed { .. }));
    }

    #[test]
    fn rollback_discards_work() {
        let conn = fixture();
        conn.begin_transaction().unwrap();
        {
            let mut stmt = conn.prepare("INSERT INTO t (a) VALUES (1)").unwrap();
            stmt.execute().unwrap();
        }
        conn.rollback().unwrap();

        let mut stmt = conn.prepare("SELECT COUNT(*) AS n FROM t").unwrap();
        stmt.execute().unwrap();
        let rows = stmt.fetch_all().unwrap();
        assert_eq!(rows[0].get("n"), Some(&Value::Int(0)));
    }
}
