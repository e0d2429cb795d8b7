// SPDX-License-Identifier: Apache-2.0

//! Gateway configuration
//!
//! Configuration is read from a JSON file. Every section has defaults, so a
//! missing file or a partial file both yield a usable configuration. Database
//! credentials are resolved from two layers: the explicit layer handed to the
//! gateway and the caller's session layer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gate_sql::{Driver, DEFAULT_PORT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::observability::Sensitive;

/// Score at which an IP is refused service
pub const DEFAULT_ERROR_POINTS_THRESHOLD: i64 = 1000;

const DEFAULT_LOG_FILE: &str = "query_log.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing database setting '{0}' in both explicit and session configuration")]
    MissingField(&'static str),

    #[error("Unknown log target '{0}'")]
    UnknownLogTarget(String),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub db: DbConfigLayer,
    pub security: SecurityConfig,
    pub log: LogConfig,
}

impl GatewayConfig {
    /// Loads configuration from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No gateway config file found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: GatewayConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded gateway configuration from {:?}", path);
        Ok(config)
    }
}

/// One layer of database connection settings. Unset fields fall through to
/// the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfigLayer {
    pub host: Option<String>,
    pub user: Option<String>,
    pub pass: Option<Sensitive<String>>,
    pub name: Option<String>,
    pub port: Option<u16>,
    pub driver: Option<String>,
}

impl DbConfigLayer {
    /// Merges `explicit` over `session`, then applies the defaults
    /// (`port = 3306`, `driver = mysql`). Host and database name are required;
    /// user and password default to empty.
    pub fn resolve(
        explicit: &DbConfigLayer,
        session: &DbConfigLayer,
    ) -> Result<ResolvedDbConfig, ConfigError> {
        fn pick<T: Clone>(a: &Option<T>, b: &Option<T>) -> Option<T> {
            a.clone().or_else(|| b.clone())
        }

        let host = pick(&explicit.host, &session.host).ok_or(ConfigError::MissingField("host"))?;
        let name = pick(&explicit.name, &session.name).ok_or(ConfigError::MissingField("name"))?;
        let driver_name = pick(&explicit.driver, &session.driver)
            .unwrap_or_else(|| Driver::default().as_str().to_string());

        Ok(ResolvedDbConfig {
            host,
            user: pick(&explicit.user, &session.user).unwrap_or_default(),
            pass: pick(&explicit.pass, &session.pass)
                .unwrap_or_else(|| Sensitive::new(String::new())),
            name,
            port: pick(&explicit.port, &session.port).unwrap_or(DEFAULT_PORT),
            driver: Driver::parse(&driver_name),
            driver_name,
        })
    }
}

/// Fully resolved connection settings
#[derive(Debug, Clone)]
pub struct ResolvedDbConfig {
    pub host: String,
    pub user: String,
    pub pass: Sensitive<String>,
    pub name: String,
    pub port: u16,
    /// DSN shape used for this driver
    pub driver: Driver,
    /// Driver name as configured, handed to the connector unchanged
    pub driver_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Reputation score at which an IP is blocked
    pub error_points_threshold: i64,
    /// Ledger database for the CLI; the application database when unset
    pub ledger_path: Option<PathBuf>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            error_points_threshold: DEFAULT_ERROR_POINTS_THRESHOLD,
            ledger_path: None,
        }
    }
}

/// Where diagnostic errors are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    File,
    Database,
    Email,
    Screen,
}

impl LogTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Database => "database",
            Self::Email => "email",
            Self::Screen => "screen",
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "database" => Ok(Self::Database),
            "email" => Ok(Self::Email),
            "screen" => Ok(Self::Screen),
            _ => Err(ConfigError::UnknownLogTarget(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Diagnostic log file
    pub file: PathBuf,
    /// Targets active before `enable_debug_mode` replaces them
    pub targets: Vec<LogTarget>,
    pub email_recipients: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
            targets: vec![LogTarget::File],
            email_recipients: Vec::new(),
        }
    }
}
