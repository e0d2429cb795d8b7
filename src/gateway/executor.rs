// SPDX-License-Identifier: Apache-2.0

//! Statement execution
//!
//! Prepare, bind, begin, run, classify, commit. Any failure after the
//! transaction was begun rolls it back before the error is returned, so the
//! transaction never outlives the call.

use std::time::Instant;

use gate_core::{
    Connection, EngineError, EngineResult, ExecutionResult, StatementKind, StatementOutcome,
};
use gate_sql::{classify, Placeholder};
use serde::Serialize;
use tracing::{debug, error};

use super::request::StatementRequest;

/// Transaction lifecycle of one gateway
///
/// The state is never reset to `NotStarted`. After a successful statement it
/// stays `Committed` and after a failure `RolledBack`; the next `execute`
/// begins a new transaction from either, since only `InProgress` skips the
/// `BEGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    #[default]
    NotStarted,
    InProgress,
    Committed,
    RolledBack,
}

impl TransactionState {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Runs `request` on `connection`, leaving `transaction` in a terminal state
/// when it was begun.
pub(crate) fn run(
    connection: &dyn Connection,
    request: &StatementRequest,
    transaction: &mut TransactionState,
) -> EngineResult<ExecutionResult> {
    let started = Instant::now();

    match attempt(connection, request, transaction, started) {
        Ok(result) => Ok(result),
        Err(e) => {
            if transaction.is_in_progress() {
                if let Err(rollback) = connection.rollback() {
                    error!(error = %rollback, "Rollback failed");
                }
                *transaction = TransactionState::RolledBack;
                debug!("Transaction rolled back");
            }
            Err(e)
        }
    }
}

fn attempt(
    connection: &dyn Connection,
    request: &StatementRequest,
    transaction: &mut TransactionState,
    started: Instant,
) -> EngineResult<ExecutionResult> {
    let mut stmt = connection.prepare(request.sql())?;

    for (name, value) in request.params() {
        let placeholder = match Placeholder::parse(name) {
            Some(Placeholder::Named(named)) => named,
            Some(Placeholder::Positional(index)) => index.to_string(),
            None => return Err(EngineError::bind_failed(name, "invalid parameter name")),
        };
        stmt.bind(&placeholder, value)?;
        debug!(parameter = %placeholder, "Parameter bound");
    }

    if !transaction.is_in_progress() {
        connection.begin_transaction()?;
        *transaction = TransactionState::InProgress;
    }

    stmt.execute()?;
    let execution_time_seconds = started.elapsed().as_secs_f64();
    let count = stmt.row_count();

    let kind = classify(request.sql());
    let outcome = match kind {
        StatementKind::Insert => StatementOutcome::Inserted {
            last_insert_id: connection.last_insert_id()?,
            affected_rows: count,
        },
        StatementKind::Update | StatementKind::Delete => {
            StatementOutcome::Modified { affected_rows: count }
        }
        StatementKind::Select => StatementOutcome::Rows {
            rows: stmt.fetch_all()?,
            row_count: count,
        },
        StatementKind::Other => StatementOutcome::Empty,
    };
    drop(stmt);

    connection.commit()?;
    *transaction = TransactionState::Committed;

    Ok(ExecutionResult {
        success: true,
        execution_time_seconds,
        sql: request.sql().to_string(),
        kind,
        outcome,
    })
}
