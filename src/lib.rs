// SPDX-License-Identifier: Apache-2.0

//! querygate: secure query gateway
//!
//! Executes parameterized statements transactionally on behalf of a client,
//! scores client addresses by the security events they trigger, and refuses
//! service once an address reaches the configured threshold.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod observability;
pub mod reputation;
pub mod validator;

pub use config::{DbConfigLayer, GatewayConfig, LogConfig, LogTarget, SecurityConfig};
pub use diagnostics::{DiagnosticLogger, FileSink, Sink};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, GatewayServices, StatementCache, StatementRequest, TransactionState};
pub use reputation::{MemoryLedgerStore, ReputationLedger};
pub use validator::ParameterValidator;
