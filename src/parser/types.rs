//! Parser configuration types

use crate::types::Delimiter;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Default maximum number of records parsed per batch
pub const DEFAULT_LINE_LIMIT: usize = 100;

/// Parser type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserType {
    /// Delimited text
    #[default]
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl ParserType {
    /// Tag compared against the `type` of mapping sources
    pub fn as_str(self) -> &'static str {
        match self {
            ParserType::Csv => "csv",
            ParserType::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parser settings of a feed type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    #[serde(rename = "type")]
    pub kind: ParserType,
    /// Field delimiter, CSV only
    pub delimiter: Delimiter,
    /// Whether the first row holds data instead of column names
    pub no_headers: bool,
    /// Maximum number of records per batch
    pub line_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            kind: ParserType::Csv,
            delimiter: Delimiter::Comma,
            no_headers: false,
            line_limit: DEFAULT_LINE_LIMIT,
        }
    }
}

impl ParserConfig {
    /// Set the delimiter
    #[must_use]
    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Treat the first row as data
    #[must_use]
    pub fn no_headers(mut self, no_headers: bool) -> Self {
        self.no_headers = no_headers;
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn line_limit(mut self, limit: usize) -> Self {
        self.line_limit = limit;
        self
    }
}

// ============================================================================
// Mapping Sources
// ============================================================================

/// A named source the feed type exposes to tampers and mappings
///
/// `value` is the column header, or the zero-based column index when the
/// source has no header row. Sources carrying a `provider` are loaded
/// lazily instead of being parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSource {
    pub label: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    /// Parser type this source belongs to, any parser when unset
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Name of the provider that loads this source on demand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl MappingSource {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Restrict the source to one parser type
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Load the source through a named provider
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Whether a parser with the given tag reads this source
    pub fn belongs_to(&self, parser: ParserType) -> bool {
        self.kind.as_deref().map_or(true, |kind| kind == parser.as_str())
    }

    /// The source column, when one is set
    pub fn column(&self) -> Option<&str> {
        let value = self.value.as_str();
        (!value.trim().is_empty()).then_some(value)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Column {
        Text(String),
        Integer(i64),
        Float(f64),
        Missing(()),
    }

    Ok(match Column::deserialize(deserializer)? {
        Column::Text(text) => text,
        Column::Integer(n) => n.to_string(),
        Column::Float(n) => n.to_string(),
        Column::Missing(()) => String::new(),
    })
}
