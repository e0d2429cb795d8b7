// SPDX-License-Identifier: Apache-2.0

//! Gateway error taxonomy
//!
//! Messages shown to callers stay generic for connection, access and
//! execution failures. The driver detail travels as the error source and
//! is written to the diagnostic log.

use gate_core::{EngineError, StorageError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Database connection error.")]
    Connection {
        #[source]
        source: EngineError,
    },

    #[error("Access denied. Your IP has been blocked due to multiple security violations.")]
    AccessDenied { ip: String },

    #[error("Validation failed for parameter: {parameter}")]
    Validation { parameter: String },

    #[error("Query execution error.")]
    QueryExecution {
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl GatewayError {
    pub fn connection(source: EngineError) -> Self {
        Self::Connection { source }
    }

    pub fn access_denied(ip: impl Into<String>) -> Self {
        Self::AccessDenied { ip: ip.into() }
    }

    pub fn validation(parameter: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
        }
    }

    pub fn query_execution(source: EngineError) -> Self {
        Self::QueryExecution { source }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
