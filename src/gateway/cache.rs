// SPDX-License-Identifier: Apache-2.0

//! Per-gateway statement result cache
//!
//! Entries live as long as the owning gateway. There is no eviction and no
//! expiry; a fresh gateway starts with an empty cache.

use std::collections::HashMap;

use gate_core::{ExecutionResult, Value};

/// Statement text plus a canonical rendering of its bound parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    sql: String,
    params: String,
}

impl CacheKey {
    pub fn new(sql: &str, params: &[(String, Value)]) -> Self {
        Self {
            sql: sql.to_string(),
            params: format!("{params:?}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct StatementCache {
    entries: HashMap<CacheKey, ExecutionResult>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&ExecutionResult> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: CacheKey, result: ExecutionResult) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use gate_core::{StatementKind, StatementOutcome};

    use super::*;

    fn result(sql: &str) -> ExecutionResult {
        ExecutionResult {
            success: true,
            execution_time_seconds: 0.001,
            sql: sql.to_string(),
            kind: StatementKind::Other,
            outcome: StatementOutcome::Empty,
        }
    }

    #[test]
    fn put_then_get() {
        let mut cache = StatementCache::new();
        let key = CacheKey::new("CREATE TABLE t (a INT)", &[]);
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), result("CREATE TABLE t (a INT)"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().sql, "CREATE TABLE t (a INT)");

        cache.clear();
        assert!(cache.is_empty());
    }
}
