// SPDX-License-Identifier: Apache-2.0

//! gate-core: shared vocabulary of the query gateway
//!
//! Types, collaborator traits, and error handling used by the gateway and
//! by every driver or store implementation.

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult, StorageError, StorageResult};
pub use event::{parameter_event_message, EventCode, SecurityEvent, ERROR_EVENT_POINTS};
pub use traits::{
    AddressAsHost, ConnectOptions, ConnectTarget, Connection, Connector, HostResolver,
    LedgerStore, Notifier, Statement,
};
pub use types::{ClientContext, ExecutionResult, Row, StatementKind, StatementOutcome, Value};
