//! Text plugins

use super::{expect_str, is_blank, value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{value_to_string, JsonValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::Deserialize;
use url::Url;

// ============================================================================
// Trim
// ============================================================================

const PHP_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Which side of the string to trim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimSide {
    #[default]
    Trim,
    Ltrim,
    Rtrim,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TrimSettings {
    character: Option<String>,
    side: TrimSide,
}

/// Trim whitespace or a set of characters
#[derive(Debug, Clone)]
pub struct Trim {
    mask: Vec<char>,
    side: TrimSide,
}

impl Trim {
    /// Trim whitespace on the given side
    pub fn new(side: TrimSide) -> Self {
        Self {
            mask: PHP_WHITESPACE.to_vec(),
            side,
        }
    }
}

impl FromConfig for Trim {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: TrimSettings = settings("trim", config)?;
        let mask = match s.character {
            Some(chars) if !chars.is_empty() => chars.chars().collect(),
            _ => PHP_WHITESPACE.to_vec(),
        };
        Ok(Self { mask, side: s.side })
    }
}

impl Tamper for Trim {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if data.is_null() {
            return value(data);
        }
        if data.is_array() || data.is_object() {
            return Err(Error::tamper("Input should be a string."));
        }
        let text = value_to_string(&data);
        let mask = self.mask.as_slice();
        let trimmed = match self.side {
            TrimSide::Trim => text.trim_matches(mask),
            TrimSide::Ltrim => text.trim_start_matches(mask),
            TrimSide::Rtrim => text.trim_end_matches(mask),
        };
        value(JsonValue::String(trimmed.to_string()))
    }
}

// ============================================================================
// Convert case
// ============================================================================

/// Case conversion operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseOperation {
    #[default]
    Ucfirst,
    Ucwords,
    Strtoupper,
    Strtolower,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConvertCaseSettings {
    operation: CaseOperation,
}

/// Change the case of a string
#[derive(Debug, Clone)]
pub struct ConvertCase {
    operation: CaseOperation,
}

impl FromConfig for ConvertCase {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: ConvertCaseSettings = settings("convert_case", config)?;
        Ok(Self {
            operation: s.operation,
        })
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Tamper for ConvertCase {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_blank(&data) {
            return value(data);
        }
        let text = expect_str(&data)?;

        let converted = match self.operation {
            CaseOperation::Strtoupper => text.to_uppercase(),
            CaseOperation::Strtolower => text.to_lowercase(),
            CaseOperation::Ucfirst => upper_first(text),
            CaseOperation::Ucwords => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for c in text.chars() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.push(c);
                    }
                    at_word_start = c.is_whitespace();
                }
                out
            }
        };
        value(JsonValue::String(converted))
    }
}

// ============================================================================
// Find replace
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FindReplaceSettings {
    find: String,
    replace: String,
    case_sensitive: bool,
    word_boundaries: bool,
    whole: bool,
}

/// Replace literal text
#[derive(Debug, Clone)]
pub struct FindReplace {
    pattern: Regex,
    replace: String,
}

impl FindReplace {
    /// Case sensitive replacement of every occurrence
    pub fn new(find: &str, replace: &str) -> Result<Self> {
        Self::from_config(&serde_json::json!({
            "find": find,
            "replace": replace,
            "case_sensitive": true,
        }))
    }
}

impl FromConfig for FindReplace {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: FindReplaceSettings = settings("find_replace", config)?;
        if s.find.is_empty() {
            return Err(Error::invalid_value("find", "cannot be empty"));
        }

        let escaped = regex::escape(&s.find);
        let pattern = if s.whole {
            format!("^{escaped}$")
        } else if s.word_boundaries {
            format!(r"\b{escaped}\b")
        } else {
            escaped
        };
        let pattern = RegexBuilder::new(&pattern)
            .case_insensitive(!s.case_sensitive)
            .build()
            .map_err(|e| Error::invalid_value("find", e.to_string()))?;

        Ok(Self {
            pattern,
            replace: s.replace,
        })
    }
}

impl Tamper for FindReplace {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_blank(&data) {
            return value(data);
        }
        let text = expect_str(&data)?;
        let replaced = self
            .pattern
            .replace_all(text, NoExpand(&self.replace))
            .into_owned();
        value(JsonValue::String(replaced))
    }
}

// ============================================================================
// HTML entities
// ============================================================================

/// Escape HTML special characters
#[derive(Debug, Clone, Default)]
pub struct HtmlEntityEncode;

impl FromConfig for HtmlEntityEncode {
    fn from_config(_config: &JsonValue) -> Result<Self> {
        Ok(Self)
    }
}

impl Tamper for HtmlEntityEncode {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_blank(&data) {
            return value(data);
        }
        let text = expect_str(&data)?;

        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#039;"),
                other => out.push(other),
            }
        }
        value(JsonValue::String(out))
    }
}

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));

/// Decode HTML entities
#[derive(Debug, Clone, Default)]
pub struct HtmlEntityDecode;

impl FromConfig for HtmlEntityDecode {
    fn from_config(_config: &JsonValue) -> Result<Self> {
        Ok(Self)
    }
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

impl Tamper for HtmlEntityDecode {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_blank(&data) {
            return value(data);
        }
        let text = expect_str(&data)?;
        let decoded = ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
            decode_entity(&caps[1]).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        });
        value(JsonValue::String(decoded.into_owned()))
    }
}

// ============================================================================
// String length / word count
// ============================================================================

/// Number of characters in a string
#[derive(Debug, Clone, Default)]
pub struct StrLen;

impl FromConfig for StrLen {
    fn from_config(_config: &JsonValue) -> Result<Self> {
        Ok(Self)
    }
}

impl Tamper for StrLen {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if data.is_null() {
            return value(data);
        }
        let text = expect_str(&data)?;
        value(JsonValue::from(text.chars().count()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WordCountSettings {
    limit: Option<usize>,
}

/// Number of space separated words
#[derive(Debug, Clone, Default)]
pub struct WordCount {
    limit: Option<usize>,
}

impl FromConfig for WordCount {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: WordCountSettings = settings("word_count", config)?;
        Ok(Self { limit: s.limit })
    }
}

impl Tamper for WordCount {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let text = expect_str(&data)?;
        let words = text.split(' ').count();
        let count = match self.limit {
            Some(limit) => words.min(limit.max(1)),
            None => words,
        };
        value(JsonValue::from(count))
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encoding modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    Base64Encode,
    Base64Decode,
    JsonEncode,
    JsonDecode,
    YamlEncode,
    YamlDecode,
}

impl EncodeMode {
    /// Whether the mode takes a whole collection
    fn handles_multiples(self) -> bool {
        !matches!(self, EncodeMode::Base64Encode | EncodeMode::Base64Decode)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EncodeSettings {
    mode: String,
}

/// Encode or decode values
///
/// Base64 modes work on scalars and are mapped over lists. The JSON and
/// YAML modes take the value as a whole.
#[derive(Debug, Clone)]
pub struct Encode {
    mode: EncodeMode,
}

impl Encode {
    /// Create an encode plugin for the given mode
    pub fn new(mode: EncodeMode) -> Self {
        Self { mode }
    }
}

impl FromConfig for Encode {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: EncodeSettings = serde_json::from_value(config.clone())
            .map_err(|e| Error::invalid_value("encode", format!("invalid settings: {e}")))?;
        let mode = serde_json::from_value(JsonValue::String(s.mode.clone())).map_err(|_| {
            Error::invalid_value(
                "mode",
                format!("The selected encode mode \"{}\" is invalid.", s.mode),
            )
        })?;
        Ok(Self { mode })
    }
}

impl Encode {
    fn apply(&self, data: JsonValue) -> Result<JsonValue> {
        match self.mode {
            EncodeMode::Base64Encode => Ok(JsonValue::String(
                STANDARD.encode(value_to_string(&data).as_bytes()),
            )),
            EncodeMode::Base64Decode => {
                let bytes = STANDARD
                    .decode(value_to_string(&data).trim())
                    .map_err(|e| Error::tamper(format!("Invalid base64 input: {e}")))?;
                Ok(JsonValue::String(
                    String::from_utf8_lossy(&bytes).into_owned(),
                ))
            }
            EncodeMode::JsonEncode => Ok(JsonValue::String(serde_json::to_string(&data)?)),
            EncodeMode::JsonDecode => {
                let text = expect_str(&data)?;
                serde_json::from_str(text)
                    .map_err(|e| Error::tamper(format!("Invalid JSON input: {e}")))
            }
            EncodeMode::YamlEncode => Ok(JsonValue::String(serde_yaml::to_string(&data)?)),
            EncodeMode::YamlDecode => {
                let text = expect_str(&data)?;
                serde_yaml::from_str(text)
                    .map_err(|e| Error::tamper(format!("Invalid YAML input: {e}")))
            }
        }
    }
}

impl Tamper for Encode {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        match data {
            JsonValue::Array(values) if !self.mode.handles_multiples() => value(JsonValue::Array(
                values
                    .into_iter()
                    .map(|v| self.apply(v))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other => value(self.apply(other)?),
        }
    }
}

// ============================================================================
// Absolute URL
// ============================================================================

static URL_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|src|codebase|code)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AbsoluteUrlSettings {
    source: String,
}

/// Rewrite relative links in HTML against a base URL from another source
#[derive(Debug, Clone)]
pub struct AbsoluteUrl {
    source: String,
}

impl FromConfig for AbsoluteUrl {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: AbsoluteUrlSettings = settings("absolute_url", config)?;
        Ok(Self { source: s.source })
    }
}

impl Tamper for AbsoluteUrl {
    fn tamper(&self, data: JsonValue, item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if self.source.is_empty() {
            return Err(Error::tamper(
                "You must define a valid source from the plugin settings.",
            ));
        }
        let Some(item) = item else {
            return Err(Error::tamper(
                "The plugin \"absolute_url\" needs a tamperable item in order to operate.",
            ));
        };

        let base = value_to_string(&item.source_property(&self.source));
        let base = Url::parse(base.trim()).map_err(|_| {
            Error::tamper(
                "You must define a valid domain in your base url data source (ie: http://example.com).",
            )
        })?;

        let Some(html) = data.as_str().filter(|s| !s.is_empty()) else {
            return value(data);
        };

        let rewritten = URL_ATTRIBUTE.replace_all(html, |caps: &regex::Captures<'_>| {
            let (raw, quote) = match (caps.get(2), caps.get(3)) {
                (Some(m), _) => (m.as_str(), '"'),
                (None, Some(m)) => (m.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };
            let link = raw.trim();
            if link.is_empty() || link.starts_with('#') || Url::parse(link).is_ok() {
                return caps[0].to_string();
            }
            match base.join(link) {
                Ok(absolute) => format!("{}={quote}{absolute}{quote}", &caps[1]),
                Err(_) => caps[0].to_string(),
            }
        });

        value(JsonValue::String(rewritten.into_owned()))
    }

    fn used_source_properties(&self) -> Vec<String> {
        vec![self.source.clone()]
    }
}
