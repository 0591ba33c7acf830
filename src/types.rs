//! Common types used throughout the import pipeline
//!
//! This module contains shared type definitions, type aliases,
//! and value helpers used across multiple modules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Ordered field name to value map
pub type ValueMap = IndexMap<String, JsonValue>;

// ============================================================================
// Delimiter
// ============================================================================

/// Field delimiter for delimited text sources
///
/// Serialized as the literal character, except for tab which uses the
/// symbolic `TAB` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
    Plus,
}

impl Delimiter {
    /// All supported delimiters
    pub const ALL: [Delimiter; 5] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
        Delimiter::Plus,
    ];

    /// The literal delimiter character
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
            Delimiter::Plus => '+',
        }
    }

    /// The configuration symbol for this delimiter
    pub fn symbol(self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Tab => "TAB",
            Delimiter::Pipe => "|",
            Delimiter::Plus => "+",
        }
    }
}

impl FromStr for Delimiter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," => Ok(Delimiter::Comma),
            ";" => Ok(Delimiter::Semicolon),
            "TAB" | "\t" => Ok(Delimiter::Tab),
            "|" => Ok(Delimiter::Pipe),
            "+" => Ok(Delimiter::Plus),
            other => Err(crate::Error::invalid_value(
                "delimiter",
                format!("'{other}' is not one of , ; TAB | +"),
            )),
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(delimiter: Delimiter) -> Self {
        delimiter.symbol().to_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Message Severity
// ============================================================================

/// Severity of a user-facing state message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Status,
    Warning,
    Error,
}

impl From<Severity> for tracing::Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Status => tracing::Level::INFO,
            Severity::Warning => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Status => "status",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

// ============================================================================
// Report Code
// ============================================================================

/// Counter incremented by `ImportState::report`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCode {
    Created,
    Updated,
    Deleted,
    Skipped,
    Failed,
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportCode::Created => "created",
            ReportCode::Updated => "updated",
            ReportCode::Deleted => "deleted",
            ReportCode::Skipped => "skipped",
            ReportCode::Failed => "failed",
        })
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Value Helpers
// ============================================================================

/// Whether a value counts as empty
///
/// Null, `false`, `0`, `""`, `"0"` and empty collections are empty.
pub fn value_is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty() || s == "0",
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
    }
}

/// Render a scalar value as text
///
/// Null becomes an empty string and booleans become `"1"` / `""`.
/// Collections are rendered as compact JSON.
pub fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => String::new(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a float back into a JSON number, preferring integers
pub fn number_value(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
