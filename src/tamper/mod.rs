//! Tamper module
//!
//! Configurable value transformations applied to item fields.
//!
//! # Overview
//!
//! The tamper module provides:
//! - `Tamper` - The plugin contract, returning an explicit `Tampered` outcome
//! - `TamperDefinition` / `ItemUsage` - Static plugin metadata
//! - `TamperRegistry` - Explicit plugin id to factory mapping
//! - `TamperChains` - Weight ordered plugin lists grouped by source field
//! - Built-in plugins for text, lists, numbers, dates and filtering
//!
//! Skipping is expressed through `Tampered::SkipData` and
//! `Tampered::SkipItem`; any `Err` returned by a plugin is a runtime
//! failure that the pipeline downgrades to a warning.

mod chain;
pub mod plugins;
mod registry;
mod types;

pub use chain::{TamperChainEntry, TamperChains};
pub use registry::{TamperFactory, TamperInstance, TamperRegistry};
pub use types::{settings, ItemUsage, Tamper, TamperDefinition, Tampered};
