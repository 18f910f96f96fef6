//! Quoting and escaping of CGIF literals.
//!
//! Anything outside `[A-Za-z0-9_]` gets wrapped in double quotes with
//! embedded quotes escaped as `\"`. A leading `*` or `?` sigil stays
//! outside the quotes so `*"New York"` still reads as a defining label.

use crate::error::{CgifError, Result};

/// True if `s` contains anything other than ASCII letters, digits or `_`
pub fn needs_quote(s: &str) -> bool {
    !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote `s` if it needs it
pub fn quotify(s: &str) -> String {
    if needs_quote(s) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

/// Quote everything after an optional leading `*` or `?`
pub fn quotify_with_prefix(s: &str) -> String {
    let (sigil, rest) = split_sigil(s);
    format!("{}{}", sigil, quotify(rest))
}

/// Strip one layer of surrounding quotes and unescape embedded quotes.
///
/// Unquoted input is returned unchanged.
pub fn unquotify(s: &str) -> Result<String> {
    if !s.starts_with('"') {
        return Ok(s.to_string());
    }
    if s.len() < 2 || !s.ends_with('"') {
        return Err(CgifError::format(format!(
            "non-terminated quoted string: {}",
            s
        )));
    }
    Ok(s[1..s.len() - 1].replace("\\\"", "\""))
}

/// Inverse of [`quotify_with_prefix`]
pub fn unquotify_with_prefix(s: &str) -> Result<String> {
    let (sigil, rest) = split_sigil(s);
    Ok(format!("{}{}", sigil, unquotify(rest)?))
}

fn split_sigil(s: &str) -> (&str, &str) {
    if s.starts_with('*') || s.starts_with('?') {
        s.split_at(1)
    } else {
        ("", s)
    }
}
