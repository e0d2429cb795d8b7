// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::sync::Arc;

use gate_core::{
    Connection, EngineError, EngineResult, LedgerStore, Row, SecurityEvent, Statement,
    StorageError, StorageResult, Value,
};
use parking_lot::Mutex;
use querygate_lib::{
    DiagnosticLogger, FileSink, GatewayServices, MemoryLedgerStore, ReputationLedger,
};

/// Everything the gateway asked of the mock connection
#[derive(Debug, Default)]
pub struct Calls {
    pub prepared: Vec<String>,
    pub bound: Vec<(String, Value)>,
    pub executes: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Connection double that records calls and fails on demand
#[derive(Default)]
pub struct RecordingConnection {
    pub calls: Arc<Mutex<Calls>>,
    pub fail_execute: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub rows: Vec<Row>,
}

impl RecordingConnection {
    pub fn new() -> (Self, Arc<Mutex<Calls>>) {
        let conn = Self::default();
        let calls = Arc::clone(&conn.calls);
        (conn, calls)
    }
}

impl Connection for RecordingConnection {
    fn driver_id(&self) -> &'static str {
        "recording"
    }

    fn prepare<'c>(&'c self, sql: &str) -> EngineResult<Box<dyn Statement + 'c>> {
        self.calls.lock().prepared.push(sql.to_string());
        Ok(Box::new(RecordingStatement { conn: self }))
    }

    fn begin_transaction(&self) -> EngineResult<()> {
        self.calls.lock().begins += 1;
        Ok(())
    }

    fn commit(&self) -> EngineResult<()> {
        if self.fail_commit {
            return Err(EngineError::transaction_error("commit refused"));
        }
        self.calls.lock().commits += 1;
        Ok(())
    }

    fn rollback(&self) -> EngineResult<()> {
        self.calls.lock().rollbacks += 1;
        if self.fail_rollback {
            return Err(EngineError::transaction_error("connection lost during rollback"));
        }
        Ok(())
    }

    fn last_insert_id(&self) -> EngineResult<String> {
        Ok("17".to_string())
    }
}

struct RecordingStatement<'c> {
    conn: &'c RecordingConnection,
}

impl Statement for RecordingStatement<'_> {
    fn bind(&mut self, name: &str, value: &Value) -> EngineResult<()> {
        self.conn
            .calls
            .lock()
            .bound
            .push((name.to_string(), value.clone()));
        Ok(())
    }

    fn execute(&mut self) -> EngineResult<()> {
        self.conn.calls.lock().executes += 1;
        if self.conn.fail_execute {
            return Err(EngineError::execution_error("deadlock detected"));
        }
        Ok(())
    }

    fn row_count(&self) -> u64 {
        if self.conn.rows.is_empty() {
            1
        } else {
            self.conn.rows.len() as u64
        }
    }

    fn fetch_all(&mut self) -> EngineResult<Vec<Row>> {
        Ok(self.conn.rows.clone())
    }
}

/// Memory store that refuses every append
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemoryLedgerStore,
}

impl LedgerStore for ReadOnlyStore {
    fn append(&self, _event: &SecurityEvent) -> StorageResult<()> {
        Err(StorageError::ledger("store is read-only"))
    }

    fn total_points(&self, ip_address: &str) -> StorageResult<i64> {
        self.inner.total_points(ip_address)
    }

    fn events_for(&self, ip_address: &str) -> StorageResult<Vec<SecurityEvent>> {
        self.inner.events_for(ip_address)
    }
}

/// Store whose score lookups fail
pub struct UnreadableStore;

impl LedgerStore for UnreadableStore {
    fn append(&self, _event: &SecurityEvent) -> StorageResult<()> {
        Ok(())
    }

    fn total_points(&self, _ip_address: &str) -> StorageResult<i64> {
        Err(StorageError::ledger("ledger unavailable"))
    }

    fn events_for(&self, _ip_address: &str) -> StorageResult<Vec<SecurityEvent>> {
        Ok(Vec::new())
    }
}

/// Services on an in-memory ledger with the diagnostic file in `dir`
pub fn services(dir: &std::path::Path, threshold: i64) -> (GatewayServices, Arc<MemoryLedgerStore>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let ledger = ReputationLedger::new(store.clone(), threshold);
    let diagnostics = DiagnosticLogger::new(Arc::new(FileSink::new(dir.join("query_log.txt"))))
        .with_ledger_store(store.clone());
    (
        GatewayServices::new(Arc::new(ledger), Arc::new(diagnostics)),
        store,
    )
}
