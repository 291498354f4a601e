//! Text helpers applied to catalog source and identifiers before they are written.

/// Identifiers that must be quoted when emitted as column or constraint names.
const RESERVED_WORDS: &[&str] = &[
    "asc",
    "check",
    "column",
    "count",
    "default",
    "desc",
    "end",
    "from",
    "group",
    "limit",
    "line",
    "offset",
    "order",
    "primary",
    "references",
    "select",
    "table",
    "to",
    "user",
    "uuid",
    "where",
    "window",
];

/// Normalize line endings to `\n` and tabs to two spaces.
pub fn normalize_source(src: &str) -> String {
    src.replace("\r\n", "\n")
        .replace("\n\r", "\n")
        .replace('\r', "\n")
        .replace('\t', "  ")
}

/// Same as [`normalize_source`], passing a missing value through untouched.
pub fn normalize_optional_source(src: Option<&str>) -> Option<String> {
    src.map(normalize_source)
}

/// Strip one pair of surrounding double quotes.
pub fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// [`unquote`] applied to each dotted part: `app."order"` becomes `app.order`.
pub fn unquote_qualified(value: &str) -> String {
    value.split('.').map(unquote).collect::<Vec<_>>().join(".")
}

/// Quote an identifier when it is a reserved word or a pseudo name like `?column?`.
pub fn quote_if_unsafe(value: &str) -> String {
    let lowered = value.to_lowercase();
    if value.contains('?') || RESERVED_WORDS.contains(&lowered.as_str()) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
