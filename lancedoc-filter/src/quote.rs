//! Identifier and literal quoting.
//!
//! Every piece of user-supplied text that ends up in a predicate string goes
//! through this module.

use std::borrow::Cow;

use lancedoc_result::{Error, Result};
use lancedoc_types::timestamp::format_sql_timestamp;

/// Quote one path segment when it is not a plain identifier.
///
/// Plain identifiers match `[A-Za-z_][A-Za-z0-9_]*` and are emitted as is.
/// Anything else is wrapped in backticks, with embedded backticks doubled.
pub fn quote_identifier(segment: &str) -> Cow<'_, str> {
    if is_plain_identifier(segment) {
        Cow::Borrowed(segment)
    } else {
        Cow::Owned(format!("`{}`", segment.replace('`', "``")))
    }
}

fn is_plain_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a dotted column path, quoting each segment separately.
pub fn quote_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| quote_identifier(s.as_ref()))
        .collect::<Vec<_>>()
        .join(".")
}

/// Single-quoted string literal with embedded quotes doubled.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Float literal. Always carries a decimal point or exponent so the engine
/// does not read it as an integer.
pub fn format_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(Error::filter(format!(
            "non-finite number {value} cannot be used in a filter"
        )));
    }
    Ok(format!("{value:?}"))
}

/// `TIMESTAMP 'YYYY-MM-DD HH:MM:SS'` for epoch seconds in UTC.
pub fn timestamp_literal(seconds: i64) -> Result<String> {
    Ok(format!("TIMESTAMP '{}'", format_sql_timestamp(seconds)?))
}

pub fn bool_literal(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}
