//! Filter plugins: skip whole items based on a field value

use super::{value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{value_to_string, JsonValue};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

// ============================================================================
// Keyword filter
// ============================================================================

static WORD_EDGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w(.*\w)?$").expect("valid regex"));

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct KeywordFilterSettings {
    words: String,
    words_list: Vec<String>,
    word_boundaries: bool,
    exact: bool,
    case_sensitive: bool,
    invert: bool,
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains { words: Vec<String>, case_sensitive: bool },
    Regex(Vec<Regex>),
}

/// Skip items unless a field contains one of the keywords
///
/// With `invert` the item is skipped when a keyword does match. List
/// values match when any element matches.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    matcher: Matcher,
    invert: bool,
}

impl KeywordFilter {
    /// Case-insensitive substring filter
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            matcher: Matcher::Contains {
                words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
                case_sensitive: false,
            },
            invert: false,
        }
    }

    /// Skip matching items instead of non-matching ones
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    fn matches(&self, field: &str) -> bool {
        match &self.matcher {
            Matcher::Contains {
                words,
                case_sensitive: true,
            } => words.iter().any(|w| field.contains(w.as_str())),
            Matcher::Contains { words, .. } => {
                let field = field.to_lowercase();
                words.iter().any(|w| field.contains(w.as_str()))
            }
            Matcher::Regex(patterns) => patterns.iter().any(|re| re.is_match(field)),
        }
    }
}

fn words_to_list(words: &str) -> Vec<String> {
    words
        .replace('\r', "")
        .split('\n')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl FromConfig for KeywordFilter {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: KeywordFilterSettings = settings("keyword_filter", config)?;
        let words = if s.words_list.is_empty() {
            words_to_list(&s.words)
        } else {
            s.words_list
        };

        let matcher = if s.exact || s.word_boundaries {
            let mut patterns = Vec::with_capacity(words.len());
            for word in &words {
                let escaped = regex::escape(word);
                let pattern = if s.exact {
                    format!("^{escaped}$")
                } else {
                    if !WORD_EDGES.is_match(word) {
                        return Err(Error::invalid_value(
                            "words",
                            "Search text must begin and end with a letter, number, or underscore when word boundaries should be respected.",
                        ));
                    }
                    format!(r"\b{escaped}\b")
                };
                patterns.push(
                    RegexBuilder::new(&pattern)
                        .case_insensitive(!s.case_sensitive)
                        .build()
                        .map_err(|e| Error::invalid_value("words", e.to_string()))?,
                );
            }
            Matcher::Regex(patterns)
        } else if s.case_sensitive {
            Matcher::Contains {
                words,
                case_sensitive: true,
            }
        } else {
            Matcher::Contains {
                words: words.iter().map(|w| w.to_lowercase()).collect(),
                case_sensitive: false,
            }
        };

        Ok(Self {
            matcher,
            invert: s.invert,
        })
    }
}

impl Tamper for KeywordFilter {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let matched = match &data {
            JsonValue::Array(values) => values.iter().any(|v| self.matches(&value_to_string(v))),
            scalar => self.matches(&value_to_string(scalar)),
        };

        if !matched && !self.invert {
            debug!("Item does not contain one of the configured keywords.");
            return Ok(Tampered::SkipItem);
        }
        if matched && self.invert {
            debug!("Item contains one of the configured keywords.");
            return Ok(Tampered::SkipItem);
        }
        value(data)
    }
}

// ============================================================================
// Required
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RequiredSettings {
    invert: bool,
}

/// Skip items whose field is empty
///
/// `"0"` and `0` are not empty here. With `invert` the item is skipped when
/// the field has a value.
#[derive(Debug, Clone, Default)]
pub struct Required {
    invert: bool,
}

impl FromConfig for Required {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: RequiredSettings = settings("required", config)?;
        Ok(Self { invert: s.invert })
    }
}

fn is_missing(data: &JsonValue) -> bool {
    match data {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(values) => values.iter().all(is_missing),
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl Tamper for Required {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_missing(&data) != self.invert {
            return Ok(Tampered::SkipItem);
        }
        value(data)
    }
}
