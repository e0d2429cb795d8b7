// SPDX-License-Identifier: Apache-2.0

//! Parameter Validator
//!
//! Checks a candidate parameter value against a pattern before it is accepted
//! into a statement's bind set. Matching is a search: the pattern may occur
//! anywhere in the value unless it is anchored.
//!
//! Patterns are either bare regular expressions (`^\d+$`) or delimited with
//! trailing flags (`/^[a-z]+$/i`). Supported flags are `i`, `m`, `s` and `x`.
//! A pattern that does not compile never matches.
//!
//! Compiled patterns are cached up to [`MAX_CACHED_PATTERNS`]. When the cache
//! is full it is emptied and refilled from the patterns in use.

use std::collections::HashMap;

use gate_core::Value;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Characters accepted as an opening delimiter
const DELIMITERS: &[char] = &['/', '#', '~', '!', '%', '|', '@', '+', ',', ';', '`'];

/// Upper bound on distinct cached patterns
pub const MAX_CACHED_PATTERNS: usize = 256;

/// Compiled pattern cache; `None` marks a pattern that failed to compile
pub struct ParameterValidator {
    pattern_cache: RwLock<HashMap<String, Option<Regex>>>,
}

impl ParameterValidator {
    pub fn new() -> Self {
        Self {
            pattern_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true when `pattern` matches the textual rendering of `value`.
    pub fn validate(&self, value: &Value, pattern: &str) -> bool {
        let text = value.render();

        if let Some(cached) = self.pattern_cache.read().get(pattern) {
            return cached.as_ref().is_some_and(|re| re.is_match(&text));
        }

        let compiled = match compile_pattern(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern, error = %e, "Invalid validation pattern");
                None
            }
        };
        let matched = compiled.as_ref().is_some_and(|re| re.is_match(&text));

        let mut cache = self.pattern_cache.write();
        if cache.len() >= MAX_CACHED_PATTERNS {
            debug!(size = cache.len(), "Pattern cache full, clearing");
            cache.clear();
        }
        cache.insert(pattern.to_string(), compiled);
        drop(cache);
        debug!(pattern, matched, "Validation pattern compiled");

        matched
    }

    /// Number of distinct patterns seen so far
    pub fn cached_patterns(&self) -> usize {
        self.pattern_cache.read().len()
    }
}

impl Default for ParameterValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a bare or delimited pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let Some((body, flags)) = split_delimited(pattern) else {
        return Regex::new(pattern);
    };

    RegexBuilder::new(body)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
}

/// Splits `/body/flags` into body and flags. Returns `None` for patterns that
/// are not delimited, which are then compiled as they are.
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let open = pattern.chars().next()?;
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        c if DELIMITERS.contains(&c) => c,
        _ => return None,
    };

    let rest = &pattern[open.len_utf8()..];
    let end = rest.rfind(close)?;
    let flags = &rest[end + close.len_utf8()..];
    if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x')) {
        return None;
    }

    Some((&rest[..end], flags))
}
