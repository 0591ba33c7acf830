//! Processor module
//!
//! Consumes tampered items and turns them into stored entities.
//!
//! # Overview
//!
//! - `ItemProcessor` - Trait implemented by every item sink
//! - `Mapping` - Copies one item source onto one entity target
//! - `MemoryProcessor` - In-memory entity store with unique-target matching
//!
//! A processor reports every item on the state it is given: `created`,
//! `updated`, `skipped` when nothing changed, or `failed` for items that
//! were marked invalid upstream.

mod memory;

pub use memory::{Entity, MemoryProcessor};

use crate::error::Result;
use crate::item::Item;
use crate::state::ImportState;
use serde::{Deserialize, Serialize};

/// Receives the items of one batch
pub trait ItemProcessor: Send {
    fn process(&mut self, items: Vec<Item>, state: &mut ImportState) -> Result<()>;
}

/// One mapping from an item source to an entity target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Entity field written
    pub target: String,
    /// Item source read
    pub source: String,
    /// Whether equal values identify the same entity
    #[serde(default)]
    pub unique: bool,
}

impl Mapping {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            unique: false,
        }
    }

    /// Mark the target as identifying
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
