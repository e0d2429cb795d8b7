// SPDX-License-Identifier: Apache-2.0

//! gate-sql: text-level SQL helpers
//!
//! Statement classification, DSN construction, and placeholder naming. None
//! of this parses SQL; it works on the literal statement text.

pub mod classify;
pub mod dsn;
pub mod placeholder;

pub use classify::classify;
pub use dsn::{build_dsn, Driver, DEFAULT_PORT};
pub use placeholder::Placeholder;
