//! Plugins in the "Other" category, several of which work with the item

use super::{value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{value_is_empty, value_to_string, JsonValue, ValueMap};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// ============================================================================
// Default value
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DefaultValueSettings {
    default_value: JsonValue,
    only_if_empty: bool,
}

/// Replace the value with a configured default
#[derive(Debug, Clone)]
pub struct DefaultValue {
    default_value: JsonValue,
    only_if_empty: bool,
}

impl DefaultValue {
    /// Always use the given default
    pub fn new(default_value: JsonValue) -> Self {
        Self {
            default_value,
            only_if_empty: false,
        }
    }

    /// Only replace empty values
    #[must_use]
    pub fn only_if_empty(mut self) -> Self {
        self.only_if_empty = true;
        self
    }
}

impl FromConfig for DefaultValue {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: DefaultValueSettings = settings("default_value", config)?;
        Ok(Self {
            default_value: s.default_value,
            only_if_empty: s.only_if_empty,
        })
    }
}

impl Tamper for DefaultValue {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if self.only_if_empty && !value_is_empty(&data) {
            return value(data);
        }
        value(self.default_value.clone())
    }
}

// ============================================================================
// Convert boolean
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ConvertBooleanSettings {
    truth_value: String,
    false_value: String,
    match_case: bool,
    no_match: String,
    other_text: String,
}

impl Default for ConvertBooleanSettings {
    fn default() -> Self {
        Self {
            truth_value: "true".to_string(),
            false_value: "false".to_string(),
            match_case: false,
            no_match: "false".to_string(),
            other_text: String::new(),
        }
    }
}

/// What to return when neither the truth nor the false value matches
#[derive(Debug, Clone, PartialEq)]
pub enum NoMatch {
    /// Return the input unchanged
    Pass,
    /// Return a fixed value
    Value(JsonValue),
}

/// Map configured strings to booleans
#[derive(Debug, Clone)]
pub struct ConvertBoolean {
    truth_value: String,
    false_value: String,
    match_case: bool,
    no_match: NoMatch,
}

impl ConvertBoolean {
    fn normalize(&self, text: &str) -> String {
        if self.match_case {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }
}

impl FromConfig for ConvertBoolean {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: ConvertBooleanSettings = settings("convert_boolean", config)?;
        let no_match = match s.no_match.as_str() {
            "pass" => NoMatch::Pass,
            "true" => NoMatch::Value(JsonValue::Bool(true)),
            "false" => NoMatch::Value(JsonValue::Bool(false)),
            "null" => NoMatch::Value(JsonValue::Null),
            "other" => NoMatch::Value(JsonValue::String(s.other_text.clone())),
            other => {
                return Err(Error::invalid_value(
                    "no_match",
                    format!("'{other}' is not one of pass, true, false, null, other"),
                ))
            }
        };

        let mut plugin = Self {
            truth_value: String::new(),
            false_value: String::new(),
            match_case: s.match_case,
            no_match,
        };
        plugin.truth_value = plugin.normalize(&s.truth_value);
        plugin.false_value = plugin.normalize(&s.false_value);
        Ok(plugin)
    }
}

impl Tamper for ConvertBoolean {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let text = self.normalize(&value_to_string(&data));
        if text == self.truth_value {
            return value(JsonValue::Bool(true));
        }
        if text == self.false_value {
            return value(JsonValue::Bool(false));
        }
        match &self.no_match {
            NoMatch::Pass => value(data),
            NoMatch::Value(v) => value(v.clone()),
        }
    }
}

// ============================================================================
// Copy
// ============================================================================

/// Copy direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyDirection {
    /// Write this value into the other source
    #[default]
    To,
    /// Replace this value with the other source's value
    From,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CopySettings {
    to_from: CopyDirection,
    source: String,
}

/// Copy a value to or from another source of the item
#[derive(Debug, Clone)]
pub struct CopySource {
    direction: CopyDirection,
    source: String,
}

impl CopySource {
    /// Create a copy plugin
    pub fn new(direction: CopyDirection, source: impl Into<String>) -> Self {
        Self {
            direction,
            source: source.into(),
        }
    }
}

impl FromConfig for CopySource {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: CopySettings = settings("copy", config)?;
        if s.source.is_empty() {
            return Err(Error::invalid_value("source", "cannot be empty"));
        }
        Ok(Self {
            direction: s.to_from,
            source: s.source,
        })
    }
}

impl Tamper for CopySource {
    fn tamper(&self, data: JsonValue, item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let item = item.ok_or_else(|| Error::missing_item("copy"))?;
        match self.direction {
            CopyDirection::To => {
                item.set_source_property(&self.source, data.clone());
                value(data)
            }
            CopyDirection::From => value(item.source_property(&self.source)),
        }
    }

    fn used_source_properties(&self) -> Vec<String> {
        match self.direction {
            CopyDirection::From => vec![self.source.clone()],
            CopyDirection::To => Vec::new(),
        }
    }
}

// ============================================================================
// Rewrite
// ============================================================================

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+\]").expect("valid regex"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RewriteSettings {
    text: String,
}

/// Build a value from a `[token]` pattern
///
/// Tokens name item sources. `[_self]` is the current value and nested
/// values use dotted paths such as `[pricing.0.amount]`. Unresolved tokens
/// become empty. A list input is rewritten element by element: list-valued
/// tokens pick the element at the same key and `{key}` in the pattern is
/// replaced by that key.
#[derive(Debug, Clone)]
pub struct Rewrite {
    text: String,
}

impl Rewrite {
    /// Create a rewrite plugin for the given pattern
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn apply(&self, data: JsonValue, replacements: &ValueMap) -> JsonValue {
        match data {
            JsonValue::Array(values) => JsonValue::Array(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(index, v)| {
                        let row = row_replacements(replacements, &index.to_string(), |list| {
                            list_element(list, index)
                        });
                        self.apply(v, &row)
                    })
                    .collect(),
            ),
            JsonValue::Object(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(key, v)| {
                        let row = row_replacements(replacements, &key, |list| {
                            list.get(&key).cloned()
                        });
                        let rewritten = self.apply(v, &row);
                        (key, rewritten)
                    })
                    .collect(),
            ),
            _ => JsonValue::String(self.render(replacements)),
        }
    }

    fn render(&self, replacements: &ValueMap) -> String {
        let mut pattern = self.text.clone();
        if let Some(key) = replacements.get("{key}") {
            pattern = pattern.replace("{key}", &value_to_string(key));
        }

        TOKEN
            .replace_all(&pattern, |caps: &regex::Captures<'_>| {
                replacements
                    .get(&caps[0])
                    .map(|v| value_to_string(&first_scalar(v)))
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Flatten a list replacement to its first element
fn first_scalar(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(values) => values.first().map(first_scalar).unwrap_or_default(),
        JsonValue::Object(map) => map.values().next().map(first_scalar).unwrap_or_default(),
        scalar => scalar.clone(),
    }
}

fn list_element(list: &JsonValue, index: usize) -> Option<JsonValue> {
    match list {
        JsonValue::Array(values) => values.get(index).cloned(),
        JsonValue::Object(map) => map.get(&index.to_string()).cloned(),
        _ => None,
    }
}

fn row_replacements(
    replacements: &ValueMap,
    key: &str,
    pick: impl Fn(&JsonValue) -> Option<JsonValue>,
) -> ValueMap {
    let mut row: ValueMap = replacements
        .iter()
        .map(|(token, v)| {
            let picked = if v.is_array() || v.is_object() {
                pick(v).unwrap_or_else(|| JsonValue::String(String::new()))
            } else {
                v.clone()
            };
            (token.clone(), picked)
        })
        .collect();
    row.insert("{key}".to_string(), JsonValue::String(key.to_string()));
    row
}

/// Collect `[a]`, `[a.b]`, ... tokens for every source value
fn extract(source: &ValueMap) -> ValueMap {
    let mut replacements = ValueMap::new();
    for (key, v) in source {
        extract_into(&mut replacements, key, v);
    }
    replacements
}

fn extract_into(replacements: &mut ValueMap, path: &str, v: &JsonValue) {
    let token = format!("[{path}]");
    match v {
        JsonValue::Array(values) => {
            replacements.entry(token).or_insert_with(|| v.clone());
            for (index, child) in values.iter().enumerate() {
                extract_into(replacements, &format!("{path}.{index}"), child);
            }
        }
        JsonValue::Object(map) => {
            replacements.entry(token).or_insert_with(|| v.clone());
            for (key, child) in map {
                extract_into(replacements, &format!("{path}.{key}"), child);
            }
        }
        scalar => {
            replacements
                .entry(token)
                .or_insert_with(|| JsonValue::String(value_to_string(scalar)));
        }
    }
}

impl FromConfig for Rewrite {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: RewriteSettings = settings("rewrite", config)?;
        Ok(Self::new(s.text))
    }
}

impl Tamper for Rewrite {
    fn tamper(&self, data: JsonValue, item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let Some(item) = item else {
            return value(data);
        };

        let mut source = item.source();
        source.insert("_self".to_string(), data.clone());
        let replacements = extract(&source);
        value(self.apply(data, &replacements))
    }

    fn used_source_properties(&self) -> Vec<String> {
        let mut properties: Vec<String> = Vec::new();
        for token in TOKEN.find_iter(&self.text) {
            let inner = token.as_str().trim_start_matches('[').trim_end_matches(']');
            let top_level = inner.split(['.', '{']).next().unwrap_or_default();
            if !top_level.is_empty() && !properties.iter().any(|p| p == top_level) {
                properties.push(top_level.to_string());
            }
        }
        properties
    }
}
