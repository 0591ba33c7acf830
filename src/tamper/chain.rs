//! Tamper chains
//!
//! Ordered plugin lists bound to source fields.

use super::registry::{TamperInstance, TamperRegistry};
use crate::error::Result;
use crate::types::JsonValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One configured plugin bound to a source field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperChainEntry {
    /// Source field the plugin transforms
    pub source: String,
    /// Plugin id
    pub plugin: String,
    /// Ordering weight, ascending
    #[serde(default)]
    pub weight: i32,
    /// Label used in messages
    #[serde(default)]
    pub label: Option<String>,
    /// Plugin configuration
    #[serde(default)]
    pub config: JsonValue,
}

impl TamperChainEntry {
    /// Create an entry with weight 0 and no configuration
    pub fn new(source: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            plugin: plugin.into(),
            weight: 0,
            label: None,
            config: JsonValue::Null,
        }
    }

    /// Set the weight
    #[must_use]
    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the label
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: JsonValue) -> Self {
        self.config = config;
        self
    }
}

/// Tamper chains keyed by source field
///
/// Each chain is ordered by ascending weight; equal weights keep insertion
/// order. Sources are iterated in the order they were first added.
#[derive(Debug, Default)]
pub struct TamperChains {
    by_source: IndexMap<String, Vec<(i32, TamperInstance)>>,
}

impl TamperChains {
    /// Create an empty set of chains
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every entry through the registry
    pub fn build(entries: &[TamperChainEntry], registry: &TamperRegistry) -> Result<Self> {
        let mut chains = Self::new();
        for entry in entries {
            let instance = registry
                .create(&entry.plugin, &entry.config)?
                .with_label(entry.label.clone());
            chains.push(&entry.source, entry.weight, instance);
        }

        debug!(
            "Built tamper chains for {} source(s), {} plugin(s)",
            chains.by_source.len(),
            entries.len()
        );
        Ok(chains)
    }

    /// Insert an instance after every entry with a weight not above its own
    pub fn push(&mut self, source: &str, weight: i32, instance: TamperInstance) {
        let chain = self.by_source.entry(source.to_string()).or_default();
        let position = chain.partition_point(|(w, _)| *w <= weight);
        chain.insert(position, (weight, instance));
    }

    /// The chain for one source, in execution order
    pub fn get(&self, source: &str) -> Option<impl Iterator<Item = &TamperInstance>> {
        self.by_source
            .get(source)
            .map(|chain| chain.iter().map(|(_, instance)| instance))
    }

    /// Iterate over sources and their chains
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec<&TamperInstance>)> {
        self.by_source.iter().map(|(source, chain)| {
            (
                source.as_str(),
                chain.iter().map(|(_, instance)| instance).collect(),
            )
        })
    }

    /// Sources that have a chain
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.by_source.keys().map(String::as_str)
    }

    /// Number of sources with a chain
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    /// Whether no chain is configured
    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
