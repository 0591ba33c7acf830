//! YAML parser for feed type definitions
//!
//! Parses and validates feed type YAML files.

use crate::error::{Error, Result};
use crate::loader::types::FeedTypeDefinition;
use crate::tamper::{TamperChains, TamperRegistry};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Entity field holding the id of stored entities
const RESERVED_TARGET: &str = "id";

/// Load a feed type definition from a file path
pub fn load_feed_type(path: impl AsRef<Path>) -> Result<FeedTypeDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!("Feed type '{}' not found", path.display()))
        } else {
            Error::config(format!(
                "Failed to read feed type file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_feed_type_from_str(&content)
}

/// Load a feed type definition from a YAML string
pub fn load_feed_type_from_str(yaml: &str) -> Result<FeedTypeDefinition> {
    let def: FeedTypeDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse feed type YAML: {e}")))?;

    validate_feed_type(&def)?;
    Ok(def)
}

/// Validate the structure of a feed type definition
fn validate_feed_type(def: &FeedTypeDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Feed type name cannot be empty"));
    }

    if def.parser.line_limit == 0 {
        return Err(Error::invalid_value(
            "parser.line_limit",
            "must be a positive integer",
        ));
    }

    for name in def.sources.keys() {
        if name.trim().is_empty() {
            return Err(Error::config("Source name cannot be empty"));
        }
    }

    for (index, tamper) in def.tampers.iter().enumerate() {
        if tamper.source.is_empty() {
            return Err(Error::config(format!(
                "Tamper #{} ({}) has an empty source",
                index + 1,
                tamper.plugin
            )));
        }
        if tamper.plugin.is_empty() {
            return Err(Error::config(format!(
                "Tamper #{} on source '{}' has an empty plugin id",
                index + 1,
                tamper.source
            )));
        }
    }

    let mut targets = HashSet::new();
    for mapping in &def.mappings {
        if mapping.source.is_empty() || mapping.target.is_empty() {
            return Err(Error::config(
                "Mapping source and target cannot be empty",
            ));
        }
        if mapping.target == RESERVED_TARGET {
            return Err(Error::invalid_value(
                "mappings",
                format!("target '{RESERVED_TARGET}' is reserved"),
            ));
        }
        if !targets.insert(mapping.target.as_str()) {
            return Err(Error::config(format!(
                "Duplicate mapping target '{}'",
                mapping.target
            )));
        }
    }

    Ok(())
}

/// Check the tamper chains against a registry
///
/// Every plugin must be registered and accept its configuration.
pub fn validate_tampers(def: &FeedTypeDefinition, registry: &TamperRegistry) -> Result<TamperChains> {
    for tamper in &def.tampers {
        if !registry.contains(&tamper.plugin) {
            return Err(Error::unknown_plugin(&tamper.plugin));
        }
    }
    TamperChains::build(&def.tampers, registry)
}
