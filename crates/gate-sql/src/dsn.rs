// SPDX-License-Identifier: Apache-2.0

//! DSN construction
//!
//! Builds the driver-specific connection strings understood by existing
//! database drivers. The three shapes must stay byte-for-byte stable.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default port when neither configuration layer supplies one
pub const DEFAULT_PORT: u16 = 3306;

/// Recognized database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Mysql,
    Pgsql,
    Sqlsrv,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Pgsql => "pgsql",
            Self::Sqlsrv => "sqlsrv",
        }
    }

    /// Parses a driver name. Unrecognized names fall back to MySQL.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Self::Mysql,
            "pgsql" => Self::Pgsql,
            "sqlsrv" => Self::Sqlsrv,
            other => {
                debug!(driver = other, "Unrecognized driver, using the MySQL DSN shape");
                Self::Mysql
            }
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the DSN for `driver`
pub fn build_dsn(driver: Driver, host: &str, database: &str, port: u16) -> String {
    match driver {
        Driver::Pgsql => format!("pgsql:host={host};port={port};dbname={database}"),
        Driver::Sqlsrv => format!("sqlsrv:Server={host},{port};Database={database}"),
        Driver::Mysql => {
            format!("mysql:host={host};dbname={database};port={port};charset=utf8mb4")
        }
    }
}
