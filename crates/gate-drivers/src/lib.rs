// SPDX-License-Identifier: Apache-2.0

//! gate-drivers: concrete collaborators for the query gateway
//!
//! - [`SqliteConnection`] / [`SqliteConnector`]: the `Connection` capability on SQLite
//! - [`SqliteLedgerStore`]: durable, append-only security event storage

pub mod ledger_store;
pub mod sqlite;

pub use ledger_store::SqliteLedgerStore;
pub use sqlite::{SqliteConnection, SqliteConnector};
