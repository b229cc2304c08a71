//! Escaping of constant values in declaration files.

use crate::value::Value;

/// Renders a value for inclusion in a declarations file.
///
/// Strings have backslashes doubled, quotes and line breaks escaped, then are
/// wrapped in quotes. Booleans render as `true`/`false`; numbers as their
/// shortest text.
pub fn escape(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for c in s.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    c => out.push(c),
                }
            }
            out.push('"');
            out
        }
        other => other.encode(),
    }
}

/// Inverse of [`escape`] for a quoted string. Returns `None` if `text` is not
/// a well-formed quoted string.
pub fn unescape(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                other => out.push(other),
            },
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}
