// SPDX-License-Identifier: Apache-2.0

//! Security events and the fixed severity catalog

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Points recorded for a diagnostic `error` row written by the database log target.
pub const ERROR_EVENT_POINTS: i64 = 10;

/// Classified security occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventCode {
    SqlInjectionAttempt,
    UnauthorizedAccess,
    MissingParameter,
    InvalidParameterFormat,
    InvalidParameterValue,
    MultipleLoginAttempts,
    DatabaseManipulationAttempt,
    InvalidSqlSyntax,
    ExcessiveQueryExecution,
    IpBlacklisted,
    CrossSiteScriptingAttempt,
    TamperingWithSession,
    MaliciousParameterLength,
    AccessFromUnknownIp,
    InvalidFileAccess,
    DebugModeEnabledUnauthorized,
    /// Diagnostic error routed to the ledger by the `database` log target
    Error,
    /// Any code outside the catalog; recorded with zero points
    Custom(String),
}

/// (code, points) pairs of the catalog, in declaration order.
const CATALOG: &[(EventCode, &str, i64)] = &[
    (EventCode::SqlInjectionAttempt, "SQL_INJECTION_ATTEMPT", 90),
    (EventCode::UnauthorizedAccess, "UNAUTHORIZED_ACCESS", 80),
    (EventCode::MissingParameter, "MISSING_PARAMETER", 20),
    (EventCode::InvalidParameterFormat, "INVALID_PARAMETER_FORMAT", 50),
    (EventCode::InvalidParameterValue, "INVALID_PARAMETER_VALUE", 25),
    (EventCode::MultipleLoginAttempts, "MULTIPLE_LOGIN_ATTEMPTS", 70),
    (
        EventCode::DatabaseManipulationAttempt,
        "DATABASE_MANIPULATION_ATTEMPT",
        100,
    ),
    (EventCode::InvalidSqlSyntax, "INVALID_SQL_SYNTAX", 40),
    (EventCode::ExcessiveQueryExecution, "EXCESSIVE_QUERY_EXECUTION", 60),
    (EventCode::IpBlacklisted, "IP_BLACKLISTED", 85),
    (
        EventCode::CrossSiteScriptingAttempt,
        "CROSS_SITE_SCRIPTING_ATTEMPT",
        75,
    ),
    (EventCode::TamperingWithSession, "TAMPERING_WITH_SESSION", 80),
    (EventCode::MaliciousParameterLength, "MALICIOUS_PARAMETER_LENGTH", 50),
    (EventCode::AccessFromUnknownIp, "ACCESS_FROM_UNKNOWN_IP", 65),
    (EventCode::InvalidFileAccess, "INVALID_FILE_ACCESS", 85),
    (
        EventCode::DebugModeEnabledUnauthorized,
        "DEBUG_MODE_ENABLED_UNAUTHORIZED",
        70,
    ),
    (EventCode::Error, "error", ERROR_EVENT_POINTS),
];

impl EventCode {
    /// Stored `type` column value
    pub fn as_str(&self) -> &str {
        if let EventCode::Custom(code) = self {
            return code;
        }
        CATALOG
            .iter()
            .find(|(code, _, _)| code == self)
            .map_or("", |(_, name, _)| name)
    }

    /// Severity weight from the catalog; unknown codes weigh nothing
    pub fn points(&self) -> i64 {
        CATALOG
            .iter()
            .find(|(code, _, _)| code == self)
            .map_or(0, |(_, _, points)| *points)
    }

    /// Parses a stored or user-supplied code. Never fails: codes outside the
    /// catalog become [`EventCode::Custom`].
    pub fn parse(value: &str) -> Self {
        CATALOG
            .iter()
            .find(|(_, name, _)| *name == value)
            .map_or_else(|| EventCode::Custom(value.to_string()), |(code, _, _)| code.clone())
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EventCode::parse(s))
    }
}

impl Serialize for EventCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EventCode::parse(&raw))
    }
}

/// One recorded security event. Immutable once appended to a ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_code: EventCode,
    pub user_id: String,
    pub ip_address: String,
    pub host_name: String,
    pub points: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// Builds an event stamped now, with points looked up from the catalog.
    pub fn new(
        event_code: EventCode,
        user_id: impl Into<String>,
        ip_address: impl Into<String>,
        host_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let points = event_code.points();
        Self {
            event_code,
            user_id: user_id.into(),
            ip_address: ip_address.into(),
            host_name: host_name.into(),
            points,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Message text for a parameter-related event
pub fn parameter_event_message(code: &EventCode, param: &str, value: &str) -> String {
    format!("Event: {code}; Param: {param}; Value: {value}")
}
