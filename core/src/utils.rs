//! Utility functions and types.

use std::fmt::{Debug, Display};

/// Redacts a secret for logging.
///
/// - Values shorter than 12 characters are replaced entirely.
/// - Longer values keep their first and last three characters so operators can tell
///   two redacted values apart.
///
/// Used for account keys, bearer tokens and SAS signatures.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.0;
        let length = value.chars().count();
        if length == 0 {
            return f.write_str("EMPTY");
        }
        if length < 12 {
            return f.write_str("***");
        }

        let head: String = value.chars().take(3).collect();
        let tail: String = value.chars().skip(length - 3).collect();
        write!(f, "{head}***{tail}")
    }
}

impl Display for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
