// SPDX-License-Identifier: Apache-2.0

use gate_core::Value;

use super::cache::CacheKey;

/// One statement with its bind set
///
/// Parameters keep insertion order. Adding a parameter under a name that is
/// already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementRequest {
    sql: String,
    params: Vec<(String, Value)>,
    validators: Vec<(String, Option<String>)>,
}

impl StatementRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Builder form of [`StatementRequest::bind`]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(name, value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Builder form of [`StatementRequest::set_validator`]
    pub fn with_validator(mut self, name: &str, pattern: &str) -> Self {
        self.set_validator(name, Some(pattern));
        self
    }

    /// Patterns the parameters must match; re-checked on every execution
    pub fn validators(&self) -> &[(String, Option<String>)] {
        &self.validators
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Replaces the statement text. The bind set belongs to the old text and
    /// is dropped with it.
    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
        self.params.clear();
        self.validators.clear();
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        upsert(&mut self.params, name.into(), value.into());
    }

    /// Sets or clears the pattern for parameter `name`.
    pub fn set_validator(&mut self, name: &str, pattern: Option<&str>) {
        upsert(
            &mut self.validators,
            name.to_string(),
            pattern.map(String::from),
        );
    }

    /// Bound parameters that carry a pattern, with that pattern
    pub fn patterned_params(&self) -> impl Iterator<Item = (&str, &Value, &str)> {
        self.validators.iter().filter_map(|(name, pattern)| {
            let pattern = pattern.as_deref()?;
            let value = self.param(name)?;
            Some((name.as_str(), value, pattern))
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.sql, &self.params)
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, name: String, value: T) {
    match entries.iter_mut().find(|(n, _)| *n == name) {
        Some(entry) => entry.1 = value,
        None => entries.push((name, value)),
    }
}
