//! YAML Loader module
//!
//! Parse feed type definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `FeedTypeDefinition` - Declarative feed type: parser, sources, tampers, mappings
//! - YAML parsing with structural validation
//! - `validate_tampers` - Checks plugin ids and settings against a registry

mod parser;
mod types;

pub use parser::{load_feed_type, load_feed_type_from_str, validate_tampers};
pub use types::FeedTypeDefinition;

#[cfg(test)]
mod tests;
