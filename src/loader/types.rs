//! Loader types
//!
//! Declarative feed type definition types for YAML parsing.

use crate::fetcher::HttpFetcherConfig;
use crate::parser::{MappingSource, ParserConfig};
use crate::processor::Mapping;
use crate::tamper::TamperChainEntry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Feed Type Definition
// ============================================================================

/// Top-level feed type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedTypeDefinition {
    /// Feed type name
    pub name: String,
    /// Human readable label
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Parser settings
    #[serde(default)]
    pub parser: ParserConfig,
    /// Settings for sources downloaded over HTTP
    #[serde(default)]
    pub http: HttpFetcherConfig,
    /// Mapping sources keyed by machine name
    #[serde(default)]
    pub sources: IndexMap<String, MappingSource>,
    /// Tamper chain entries
    #[serde(default)]
    pub tampers: Vec<TamperChainEntry>,
    /// Source to target mappings
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

impl FeedTypeDefinition {
    /// Create a definition with default parser settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            parser: ParserConfig::default(),
            http: HttpFetcherConfig::default(),
            sources: IndexMap::new(),
            tampers: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Label, falling back to the name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Sources loaded through a provider, with the provider name
    pub fn provided_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources.iter().filter_map(|(name, source)| {
            source
                .provider
                .as_deref()
                .map(|provider| (name.as_str(), provider))
        })
    }

    /// Targets marked unique
    pub fn unique_targets(&self) -> impl Iterator<Item = &str> {
        self.mappings
            .iter()
            .filter(|mapping| mapping.unique)
            .map(|mapping| mapping.target.as_str())
    }
}
