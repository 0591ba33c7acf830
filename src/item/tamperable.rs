//! Item view handed to tamper plugins

use super::record::Item;
use crate::types::{JsonValue, ValueMap};

/// Access to the carrier item from inside a tamper plugin
///
/// Plugins that declare `ItemUsage::Ignored` never receive one.
pub trait TamperableItem {
    /// All source values of the item
    fn source(&self) -> ValueMap;

    /// A single source value, null when unknown
    fn source_property(&self, property: &str) -> JsonValue;

    /// Overwrite a single source value
    fn set_source_property(&mut self, property: &str, data: JsonValue);
}

impl TamperableItem for Item {
    fn source(&self) -> ValueMap {
        self.to_array()
    }

    fn source_property(&self, property: &str) -> JsonValue {
        self.get(property).clone()
    }

    fn set_source_property(&mut self, property: &str, data: JsonValue) {
        self.set(property, data);
    }
}
