// SPDX-License-Identifier: Apache-2.0

//! Collaborator capabilities required by the gateway
//!
//! The gateway never talks to a database engine, a log file, or a mail
//! server directly. Everything goes through the traits below so that the
//! core can be driven by real drivers in production and by recording mocks
//! in tests.

use crate::error::{EngineResult, StorageResult};
use crate::event::SecurityEvent;
use crate::types::{Row, Value};

/// A prepared statement bound to the connection that produced it
pub trait Statement {
    /// Binds a value to a placeholder.
    ///
    /// `name` is either a named placeholder including its sigil (`:id`) or a
    /// 1-based position rendered as a decimal string.
    fn bind(&mut self, name: &str, value: &Value) -> EngineResult<()>;

    /// Runs the statement. Result rows, if any, are buffered for [`Statement::fetch_all`].
    fn execute(&mut self) -> EngineResult<()>;

    /// Rows affected by the last execution, or rows returned for a query
    fn row_count(&self) -> u64;

    /// Drains the buffered result rows
    fn fetch_all(&mut self) -> EngineResult<Vec<Row>>;
}

/// An open database connection
///
/// One gateway owns exactly one connection. Implementations must raise
/// errors instead of returning sentinel values, and must prepare statements
/// natively rather than emulating them.
pub trait Connection: Send {
    /// Returns the identifier of the backing driver (e.g., "sqlite")
    fn driver_id(&self) -> &'static str;

    fn prepare<'c>(&'c self, sql: &str) -> EngineResult<Box<dyn Statement + 'c>>;

    fn begin_transaction(&self) -> EngineResult<()>;

    fn commit(&self) -> EngineResult<()>;

    fn rollback(&self) -> EngineResult<()>;

    /// Identifier generated by the most recent insert, as text
    fn last_insert_id(&self) -> EngineResult<String>;
}

/// Options every connection must be opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Errors surface as `Err`, never as silent status codes
    pub raise_errors: bool,
    /// Use server-side prepared statements
    pub emulate_prepares: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            raise_errors: true,
            emulate_prepares: false,
        }
    }
}

/// Everything a connector needs to reach a database
#[derive(Clone)]
pub struct ConnectTarget {
    pub dsn: String,
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub options: ConnectOptions,
}

impl std::fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("dsn", &self.dsn)
            .field("driver", &self.driver)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("options", &self.options)
            .finish()
    }
}

/// Opens connections. Pooling, if any, lives behind this trait.
pub trait Connector: Send + Sync {
    fn connect(&self, target: &ConnectTarget) -> EngineResult<Box<dyn Connection>>;
}

/// Durable, append-only storage for security events
///
/// Implementations must serialize concurrent `append`/`total_points` calls
/// themselves; the ledger keeps no in-process copy of scores.
pub trait LedgerStore: Send + Sync {
    fn append(&self, event: &SecurityEvent) -> StorageResult<()>;

    /// Sum of points recorded for `ip_address` (0 when there are none)
    fn total_points(&self, ip_address: &str) -> StorageResult<i64>;

    /// Every event recorded for `ip_address`, oldest first
    fn events_for(&self, ip_address: &str) -> StorageResult<Vec<SecurityEvent>>;
}

/// Reverse lookup used to enrich security events
pub trait HostResolver: Send + Sync {
    /// Returns the host name for `ip_address`, or the address itself when
    /// it cannot be resolved.
    fn resolve(&self, ip_address: &str) -> String;
}

/// Resolver that performs no lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressAsHost;

impl HostResolver for AddressAsHost {
    fn resolve(&self, ip_address: &str) -> String {
        ip_address.to_string()
    }
}

/// Outbound notification channel used by the `email` log target
pub trait Notifier: Send + Sync {
    fn notify(&self, recipients: &[String], subject: &str, body: &str) -> StorageResult<()>;
}
