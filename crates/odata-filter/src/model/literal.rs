//! OData literal values and their textual form.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed value that can appear on the right side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Null,
}

impl Literal {
    /// Renders the literal in OData URL syntax.
    ///
    /// Strings are single-quoted with embedded quotes doubled, numbers use
    /// their shortest round-trip form, booleans are lowercase and timestamps
    /// are unquoted ISO 8601 in UTC.
    pub fn render(&self) -> String {
        match self {
            Literal::String(s) => quote(s),
            Literal::Number(n) => format_number(*n),
            Literal::Boolean(b) => b.to_string(),
            Literal::DateTime(dt) => format_datetime(dt),
            Literal::Guid(g) => g.hyphenated().to_string(),
            Literal::Null => "null".to_string(),
        }
    }

    /// Returns true when the literal carries no usable value.
    pub fn is_blank(&self) -> bool {
        match self {
            Literal::String(s) => s.is_empty(),
            Literal::Number(n) => !n.is_finite(),
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::DateTime(value)
    }
}

impl From<Uuid> for Literal {
    fn from(value: Uuid) -> Self {
        Literal::Guid(value)
    }
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Formats a number without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SSZ`. Sub-second precision is dropped.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
