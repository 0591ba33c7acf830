//! Date/time plugins

use super::{expect_str, is_blank, value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{JsonValue, OptionStringExt};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Formats tried when no explicit format is configured
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y",
    "%d %B %Y", "%d %b %Y",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StrToTimeSettings {
    date_format: Option<String>,
    fallback: bool,
}

/// Convert a date string into a Unix timestamp
///
/// Naive date/times are read as UTC. When `date_format` is set, only that
/// format is tried unless `fallback` allows the generic formats too.
#[derive(Debug, Clone, Default)]
pub struct StrToTime {
    date_format: Option<String>,
    fallback: bool,
}

impl StrToTime {
    /// Parse with an explicit chrono format
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            date_format: Some(format.into()),
            fallback: false,
        }
    }
}

impl FromConfig for StrToTime {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: StrToTimeSettings = settings("strtotime", config)?;
        Ok(Self {
            date_format: s.date_format.none_if_empty(),
            fallback: s.fallback,
        })
    }
}

fn parse_with_format(text: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_str(text, format) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Some(dt.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn parse_generic(text: &str) -> Option<i64> {
    if let Some(ts) = text.strip_prefix('@') {
        return ts.parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }
    DATETIME_FORMATS
        .iter()
        .chain(DATE_FORMATS)
        .find_map(|format| parse_with_format(text, format))
}

impl Tamper for StrToTime {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        if is_blank(&data) {
            return value(data);
        }
        let text = expect_str(&data)?.trim();

        if let Some(format) = &self.date_format {
            if let Some(ts) = parse_with_format(text, format) {
                return value(JsonValue::from(ts));
            }
            if !self.fallback {
                return Err(Error::tamper(format!(
                    "Could not convert \"{text}\" using the date format \"{format}\"."
                )));
            }
        }

        parse_generic(text)
            .map(|ts| Tampered::Value(JsonValue::from(ts)))
            .ok_or_else(|| Error::tamper(format!("Could not convert \"{text}\" to a timestamp.")))
    }
}
