// SPDX-License-Identifier: Apache-2.0

//! Data types shared by the gateway, its drivers, and its stores
//!
//! These types are driver-agnostic: a SQLite row and a mock row both end up
//! as a [`Row`] of [`Value`]s.

use std::borrow::Cow;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Universal value representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Textual rendering used when a value is matched against a pattern.
    ///
    /// Null and `false` render as the empty string, `true` as `1`.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Value::Null | Value::Bool(false) => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("1"),
            Value::Int(i) => Cow::Owned(i.to_string()),
            Value::Float(f) => Cow::Owned(f.to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A single result row, columns kept in the order the driver returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column. A repeated column name replaces the earlier value,
    /// matching associative fetch semantics.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(existing) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.columns.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Statement classification derived from the leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
    Other,
}

impl Default for StatementKind {
    fn default() -> Self {
        Self::Other
    }
}

/// Kind-specific part of an execution result. Exactly one shape applies.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutcome {
    Inserted {
        last_insert_id: String,
        affected_rows: u64,
    },
    Modified {
        affected_rows: u64,
    },
    Rows {
        rows: Vec<Row>,
        row_count: u64,
    },
    Empty,
}

/// Result of one successful `execute()`
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub execution_time_seconds: f64,
    pub sql: String,
    pub kind: StatementKind,
    pub outcome: StatementOutcome,
}

impl ExecutionResult {
    pub fn last_insert_id(&self) -> Option<&str> {
        match &self.outcome {
            StatementOutcome::Inserted { last_insert_id, .. } => Some(last_insert_id),
            _ => None,
        }
    }

    pub fn affected_rows(&self) -> Option<u64> {
        match &self.outcome {
            StatementOutcome::Inserted { affected_rows, .. }
            | StatementOutcome::Modified { affected_rows } => Some(*affected_rows),
            _ => None,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match &self.outcome {
            StatementOutcome::Rows { rows, .. } => Some(rows),
            _ => None,
        }
    }

    pub fn row_count(&self) -> Option<u64> {
        match &self.outcome {
            StatementOutcome::Rows { row_count, .. } => Some(*row_count),
            _ => None,
        }
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.success)?;
        map.serialize_entry("executionTimeSeconds", &self.execution_time_seconds)?;
        map.serialize_entry("sql", &self.sql)?;
        map.serialize_entry("kind", &self.kind)?;
        match &self.outcome {
            StatementOutcome::Inserted {
                last_insert_id,
                affected_rows,
            } => {
                map.serialize_entry("lastInsertId", last_insert_id)?;
                map.serialize_entry("affectedRows", affected_rows)?;
            }
            StatementOutcome::Modified { affected_rows } => {
                map.serialize_entry("affectedRows", affected_rows)?;
            }
            StatementOutcome::Rows { rows, row_count } => {
                map.serialize_entry("rows", rows)?;
                map.serialize_entry("rowCount", row_count)?;
            }
            StatementOutcome::Empty => {}
        }
        map.end()
    }
}

/// The requesting client as reported by the HTTP/session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub ip_address: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Reverse-resolved host name, filled in at gateway construction
    #[serde(default)]
    pub host_name: Option<String>,
}

impl ClientContext {
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_id: None,
            host_name: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// User id as recorded in security events
    pub fn user_label(&self) -> &str {
        self.user_id.as_deref().unwrap_or("unknown")
    }

    /// Host name as recorded in security events; falls back to the address
    pub fn host_label(&self) -> &str {
        self.host_name.as_deref().unwrap_or(&self.ip_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_render_matches_string_cast() {
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::Bool(false).render(), "");
        assert_eq!(Value::Bool(true).render(), "1");
        assert_eq!(Value::Int(-42).render(), "-42");
        assert_eq!(Value::Float(1.5).render(), "1.5");
        assert_eq!(Value::from("abc").render(), "abc");
    }

    #[test]
    fn row_keeps_column_order_and_replaces_duplicates() {
        let mut row = Row::new();
        row.push("id", Value::Int(1));
        row.push("name", Value::from("a"));
        row.push("id", Value::Int(2));

        let names: Vec<&str> = row.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(row.get("id"), Some(&Value::Int(2)));
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"id":2,"name":"a"}"#
        );
    }

    #[test]
    fn execution_result_serializes_only_kind_specific_fields() {
        let result = ExecutionResult {
            success: true,
            execution_time_seconds: 0.5,
            sql: "UPDATE t SET a = 1".to_string(),
            kind: StatementKind::Update,
            outcome: StatementOutcome::Modified { affected_rows: 3 },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["affectedRows"], 3);
        assert_eq!(json["kind"], "update");
        assert!(json.get("lastInsertId").is_none());
        assert!(json.get("rows").is_none());
        assert_eq!(result.row_count(), None);
        assert_eq!(result.affected_rows(), Some(3));
    }

    #[test]
    fn client_labels_fall_back() {
        let client = ClientContext::new("10.0.0.5");
        assert_eq!(client.user_label(), "unknown");
        assert_eq!(client.host_label(), "10.0.0.5");

        let client = client.with_user("42");
        assert_eq!(client.user_label(), "42");
    }
}
