// SPDX-License-Identifier: Apache-2.0

//! Statement classification
//!
//! The result shape of a statement is decided from its leading keyword with
//! a case-insensitive prefix match on the trimmed text. This is a heuristic,
//! not a parser: leading comments and CTEs classify as `Other`.

use gate_core::StatementKind;

const PREFIXES: &[(&str, StatementKind)] = &[
    ("INSERT", StatementKind::Insert),
    ("UPDATE", StatementKind::Update),
    ("DELETE", StatementKind::Delete),
    ("SELECT", StatementKind::Select),
];

/// Classify SQL by its leading keyword
pub fn classify(sql: &str) -> StatementKind {
    let trimmed = sql.trim_start();

    PREFIXES
        .iter()
        .find(|(prefix, _)| starts_with_ignore_case(trimmed, prefix))
        .map_or(StatementKind::Other, |(_, kind)| *kind)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}
