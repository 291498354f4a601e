//! Text-pattern discovery of the objects a generated statement depends on.
//!
//! These scan the DDL this crate writes, not arbitrary SQL.

use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::unquote_qualified;

/// Functions that exist in every database and never need a file of their own.
const BUILTIN_FUNCTIONS: [&str; 2] = ["now", "nextval"];

fn table_reference_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)\breferences\s+((?:"[^"]+"|[\w$]+)(?:\.(?:"[^"]+"|[\w$]+))*)"#).ok())
        .as_ref()
}

fn function_reference_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)\bdefault\s+((?:"[^"]+"|[\w$]+)(?:\.(?:"[^"]+"|[\w$]+))*)\s*\("#).ok())
        .as_ref()
}

/// Identifiers following `references`, unquoted part by part, in source order.
pub fn extract_table_references(sql: &str) -> Vec<String> {
    let Some(pattern) = table_reference_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(sql)
        .filter_map(|captures| captures.get(1))
        .map(|identifier| unquote_qualified(identifier.as_str()))
        .collect()
}

/// Functions called as column defaults, minus the builtins.
pub fn extract_function_references(sql: &str) -> Vec<String> {
    let Some(pattern) = function_reference_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(sql)
        .filter_map(|captures| captures.get(1))
        .map(|identifier| unquote_qualified(identifier.as_str()))
        .filter(|name| {
            let last = name.rsplit('.').next().unwrap_or(name).to_lowercase();
            !BUILTIN_FUNCTIONS.contains(&last.as_str())
        })
        .collect()
}

/// True when the dotted parts of `identifier` appear as consecutive
/// dotted segments of `file_name`.
///
/// `table.app.users.sql` matches `users` and `app.users`, but not `user`.
pub fn file_matches_identifier(file_name: &str, identifier: &str) -> bool {
    let segments: Vec<&str> = file_name.split('.').collect();
    let parts: Vec<&str> = identifier.split('.').collect();
    if parts.is_empty() || parts.len() > segments.len() {
        return false;
    }
    segments.windows(parts.len()).any(|window| window == parts.as_slice())
}
