//! Item module
//!
//! One in-flight record flowing through the import pipeline.
//!
//! # Overview
//!
//! The item module provides:
//! - `Item` - Ordered property bag with declared fields, an overflow bag and validity marking
//! - `TamperableItem` - The view of an item that tamper plugins are allowed to touch
//!
//! The field name `data` is reserved: it always resolves into the overflow
//! bag, even when a declared property with the same name exists.

mod record;
mod tamperable;

pub use record::{Item, RESERVED_FIELD};
pub use tamperable::TamperableItem;

#[cfg(test)]
mod tests;
