//! List plugins: explode, implode, aggregate, unique

use super::{expect_str, value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{number_value, value_to_string, JsonValue};
use serde::Deserialize;

// ============================================================================
// Explode
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ExplodeSettings {
    separator: String,
    limit: Option<i64>,
}

impl Default for ExplodeSettings {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            limit: None,
        }
    }
}

/// Split a string into a list
///
/// The separator understands `%s` (space), `%t` (tab), `%n` (line feed)
/// and `%r` (carriage return). A positive limit caps the number of parts,
/// a negative one drops that many parts from the end.
#[derive(Debug, Clone)]
pub struct Explode {
    separator: String,
    limit: Option<i64>,
}

impl Explode {
    /// Create an explode plugin without a limit
    pub fn new(separator: &str) -> Self {
        Self {
            separator: decode_separator(separator),
            limit: None,
        }
    }
}

fn decode_separator(separator: &str) -> String {
    separator
        .replace("%s", " ")
        .replace("%t", "\t")
        .replace("%n", "\n")
        .replace("%r", "\r")
}

impl FromConfig for Explode {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: ExplodeSettings = settings("explode", config)?;
        let separator = decode_separator(&s.separator);
        if separator.is_empty() {
            return Err(Error::invalid_value("separator", "cannot be empty"));
        }
        Ok(Self {
            separator,
            limit: s.limit,
        })
    }
}

impl Tamper for Explode {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if data.is_null() {
            return value(data);
        }
        let text = expect_str(&data)?;

        let parts: Vec<&str> = match self.limit {
            None => text.split(self.separator.as_str()).collect(),
            Some(limit) if limit > 0 => text.splitn(limit as usize, self.separator.as_str()).collect(),
            Some(0) => vec![text],
            Some(limit) => {
                let mut parts: Vec<&str> = text.split(self.separator.as_str()).collect();
                let keep = parts.len().saturating_sub(limit.unsigned_abs() as usize);
                parts.truncate(keep);
                parts
            }
        };

        value(JsonValue::Array(
            parts
                .into_iter()
                .map(|p| JsonValue::String(p.to_string()))
                .collect(),
        ))
    }
}

// ============================================================================
// Implode
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ImplodeSettings {
    glue: String,
}

impl Default for ImplodeSettings {
    fn default() -> Self {
        Self {
            glue: ",".to_string(),
        }
    }
}

/// Join a list into a single string
///
/// A scalar input is treated as a list of one.
#[derive(Debug, Clone)]
pub struct Implode {
    glue: String,
}

impl Implode {
    /// Create an implode plugin with the given glue
    pub fn new(glue: &str) -> Self {
        Self {
            glue: decode_separator(glue),
        }
    }
}

impl FromConfig for Implode {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: ImplodeSettings = settings("implode", config)?;
        Ok(Self::new(&s.glue))
    }
}

impl Tamper for Implode {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let joined = match &data {
            JsonValue::Array(values) => values
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join(&self.glue),
            scalar => value_to_string(scalar),
        };
        value(JsonValue::String(joined))
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Average,
    #[default]
    Count,
    Max,
    Median,
    Min,
    Mode,
    Range,
    Sum,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AggregateSettings {
    function: AggregateFunction,
    count: Option<String>,
}

/// Reduce a list of numbers to one number
#[derive(Debug, Clone)]
pub struct Aggregate {
    function: AggregateFunction,
    recursive: bool,
}

impl Aggregate {
    /// Create an aggregate plugin
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            recursive: false,
        }
    }
}

impl FromConfig for Aggregate {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: AggregateSettings = settings("aggregate", config)?;
        Ok(Self {
            function: s.function,
            recursive: s.count.as_deref() == Some("recursive"),
        })
    }
}

fn count_recursive(values: &[JsonValue]) -> usize {
    values
        .iter()
        .map(|v| match v {
            JsonValue::Array(inner) => 1 + count_recursive(inner),
            _ => 1,
        })
        .sum()
}

fn to_number(value: &JsonValue) -> Result<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::tamper("Input contains an invalid number.")),
        JsonValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::tamper(format!("Value \"{s}\" is not numeric."))),
        JsonValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null => Ok(0.0),
        _ => Err(Error::tamper("Input contains a nested list.")),
    }
}

impl Tamper for Aggregate {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let JsonValue::Array(values) = data else {
            return Err(Error::tamper("Input should be an array."));
        };

        if self.function == AggregateFunction::Count {
            let count = if self.recursive {
                count_recursive(&values)
            } else {
                values.len()
            };
            return value(JsonValue::from(count));
        }

        let numbers = values.iter().map(to_number).collect::<Result<Vec<f64>>>()?;
        if numbers.is_empty() {
            return value(JsonValue::Null);
        }

        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let sum: f64 = numbers.iter().sum();

        let result = match self.function {
            AggregateFunction::Average => sum / numbers.len() as f64,
            AggregateFunction::Max => max,
            AggregateFunction::Min => min,
            AggregateFunction::Range => max - min,
            AggregateFunction::Sum => sum,
            AggregateFunction::Median => {
                let mut sorted = numbers.clone();
                sorted.sort_by(f64::total_cmp);
                let last = sorted.len() - 1;
                (sorted[last / 2] + sorted[last.div_ceil(2)]) / 2.0
            }
            AggregateFunction::Mode => {
                // First value reaching the highest frequency wins
                let mut counts: Vec<(f64, usize)> = Vec::new();
                for n in &numbers {
                    match counts.iter_mut().find(|(v, _)| v == n) {
                        Some((_, c)) => *c += 1,
                        None => counts.push((*n, 1)),
                    }
                }
                let highest = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
                counts
                    .iter()
                    .find(|(_, c)| *c == highest)
                    .map_or(0.0, |(v, _)| *v)
            }
            AggregateFunction::Count => values.len() as f64,
        };

        value(number_value(result))
    }
}

// ============================================================================
// Unique
// ============================================================================

/// Drop repeated values, keeping the first occurrence
#[derive(Debug, Clone, Default)]
pub struct Unique;

impl FromConfig for Unique {
    fn from_config(_config: &JsonValue) -> Result<Self> {
        Ok(Self)
    }
}

impl Tamper for Unique {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let JsonValue::Array(values) = data else {
            return value(data);
        };

        let mut unique: Vec<JsonValue> = Vec::with_capacity(values.len());
        for v in values {
            if !unique.contains(&v) {
                unique.push(v);
            }
        }
        value(JsonValue::Array(unique))
    }
}
