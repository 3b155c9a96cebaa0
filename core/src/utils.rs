//! Utility functions and types.

use std::fmt::Debug;

/// Redacts secret material in `Debug` output.
///
/// - Empty values print as `EMPTY`.
/// - Strings shorter than 12 characters are entirely redacted.
/// - Longer strings keep their first and last three characters so different
///   tokens can still be told apart in logs.
/// - Raw key bytes never print any content, only their length.
pub enum Redact<'a> {
    /// A textual secret like a token or a connection string.
    Text(&'a str),
    /// A binary secret like a decoded account key.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact::Text(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact::Text(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact::Text(value.as_deref().unwrap_or_default())
    }
}

impl<'a> From<&'a [u8]> for Redact<'a> {
    fn from(value: &'a [u8]) -> Self {
        Redact::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Redact<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Redact::Bytes(value.as_slice())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Redact::Text(v) if v.is_empty() => f.write_str("EMPTY"),
            Redact::Text(v) if v.len() < 12 || !v.is_char_boundary(3) => f.write_str("***"),
            Redact::Text(v) => {
                let length = v.len();
                if !v.is_char_boundary(length - 3) {
                    return f.write_str("***");
                }
                f.write_str(&v[..3])?;
                f.write_str("***")?;
                f.write_str(&v[length - 3..])
            }
            Redact::Bytes(v) if v.is_empty() => f.write_str("EMPTY"),
            Redact::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}
