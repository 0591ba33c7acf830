//! Lazily loaded sources

use crate::error::Result;
use crate::item::Item;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a source provider may know about the running import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// Feed type name
    pub feed: String,
    /// Location the feed was fetched from
    pub source: Option<String>,
}

impl RunContext {
    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Loads the value of a source that is not part of the parsed record
///
/// Called at most once per item and source, and only when a tamper plugin
/// reads a source the item does not hold yet.
pub trait SourceProvider: Send + Sync {
    fn source_element(&self, context: &RunContext, item: &Item) -> Result<JsonValue>;
}

impl<F> SourceProvider for F
where
    F: Fn(&RunContext, &Item) -> Result<JsonValue> + Send + Sync,
{
    fn source_element(&self, context: &RunContext, item: &Item) -> Result<JsonValue> {
        self(context, item)
    }
}

/// Provides the same value for every item
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantSource(pub JsonValue);

impl SourceProvider for ConstantSource {
    fn source_element(&self, _context: &RunContext, _item: &Item) -> Result<JsonValue> {
        Ok(self.0.clone())
    }
}

/// Provides a value from the run context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// The feed type name
    FeedName,
    /// The fetched location, null when unknown
    FeedSource,
}

impl ContextSource {
    /// Provider names understood by feed type definitions
    pub const NAMES: [&'static str; 2] = ["feed_name", "feed_source"];

    /// Look up a provider by its configured name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "feed_name" => Some(ContextSource::FeedName),
            "feed_source" => Some(ContextSource::FeedSource),
            _ => None,
        }
    }
}

impl SourceProvider for ContextSource {
    fn source_element(&self, context: &RunContext, _item: &Item) -> Result<JsonValue> {
        Ok(match self {
            ContextSource::FeedName => JsonValue::String(context.feed.clone()),
            ContextSource::FeedSource => context
                .source
                .clone()
                .map_or(JsonValue::Null, JsonValue::String),
        })
    }
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextSource::FeedName => "feed_name",
            ContextSource::FeedSource => "feed_source",
        })
    }
}
