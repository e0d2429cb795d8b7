// SPDX-License-Identifier: Apache-2.0

//! Placeholder names
//!
//! Parameters are added by name. A name made only of digits binds
//! positionally (1-based); a name with a `:`, `@` or `$` sigil binds to that
//! named placeholder; a bare identifier is treated as `:identifier`.

/// How a parameter name maps onto the statement's placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Named(String),
    Positional(usize),
}

impl Placeholder {
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if name.bytes().all(|b| b.is_ascii_digit()) {
            return match name.parse::<usize>() {
                Ok(0) | Err(_) => None,
                Ok(index) => Some(Self::Positional(index)),
            };
        }

        if name.starts_with([':', '@', '$']) {
            if name.len() == 1 {
                return None;
            }
            return Some(Self::Named(name.to_string()));
        }

        Some(Self::Named(format!(":{name}")))
    }
}
