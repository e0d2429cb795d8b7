// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the gateway collaborators
//!
//! Driver-specific failures are mapped to [`EngineError`], failures of the
//! security-event and diagnostic stores to [`StorageError`]. Keeping the two
//! apart lets callers tell "the statement failed" from "we could not record
//! what happened".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all database driver operations
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Statement preparation failed: {message}")]
    PrepareFailed { message: String },

    #[error("Parameter binding failed for {parameter}: {message}")]
    BindFailed { parameter: String, message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("Transaction error: {message}")]
    TransactionError { message: String },
}

impl EngineError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn prepare_failed(msg: impl Into<String>) -> Self {
        Self::PrepareFailed { message: msg.into() }
    }

    pub fn bind_failed(parameter: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::BindFailed {
            parameter: parameter.into(),
            message: msg.into(),
        }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn transaction_error(msg: impl Into<String>) -> Self {
        Self::TransactionError { message: msg.into() }
    }
}

/// Result type alias for driver operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure of a durable store: the security-event ledger or a log sink.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger store error: {message}")]
    Ledger { message: String },

    #[error("Notification dispatch failed: {message}")]
    Notification { message: String },
}

impl StorageError {
    pub fn io(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            target: target.into(),
            source,
        }
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger { message: msg.into() }
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification { message: msg.into() }
    }
}

/// Result type alias for store operations
pub type StorageResult<T> = Result<T, StorageError>;
