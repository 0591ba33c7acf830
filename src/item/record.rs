//! Item record implementation

use crate::types::{JsonValue, ValueMap};
use serde::{Deserialize, Serialize};

/// Field name that always resolves into the overflow bag
pub const RESERVED_FIELD: &str = "data";

static NULL: JsonValue = JsonValue::Null;

/// A single record produced by a parser
///
/// Declared properties are the fields a concrete item type knows about up
/// front. Every other field lives in the overflow bag. Lookups never fail:
/// unknown fields read as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Declared properties, in declaration order
    #[serde(default)]
    declared: ValueMap,
    /// Overflow bag for undeclared fields and the reserved `data` field
    #[serde(default)]
    data: ValueMap,
    /// Validity flag
    #[serde(default = "default_valid")]
    valid: bool,
    /// Reason the item was marked invalid
    #[serde(default)]
    invalid_message: String,
}

fn default_valid() -> bool {
    true
}

impl Default for Item {
    fn default() -> Self {
        Self {
            declared: ValueMap::new(),
            data: ValueMap::new(),
            valid: true,
            invalid_message: String::new(),
        }
    }
}

impl Item {
    /// Create an item without declared properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an item with the given declared properties, all null
    pub fn with_declared<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared = names
            .into_iter()
            .map(|name| (name.into(), JsonValue::Null))
            .collect();

        Self {
            declared,
            ..Self::default()
        }
    }

    /// Create an item from a field map
    pub fn from_map(map: impl IntoIterator<Item = (String, JsonValue)>) -> Self {
        let mut item = Self::new();
        item.from_array(map);
        item
    }

    /// Get a field value, null when unknown
    pub fn get(&self, field: &str) -> &JsonValue {
        if field != RESERVED_FIELD {
            if let Some(value) = self.declared.get(field) {
                return value;
            }
        }
        self.data.get(field).unwrap_or(&NULL)
    }

    /// Set a field value
    pub fn set(&mut self, field: &str, value: JsonValue) {
        if field != RESERVED_FIELD {
            if let Some(slot) = self.declared.get_mut(field) {
                *slot = value;
                return;
            }
        }
        self.data.insert(field.to_string(), value);
    }

    /// Whether a field is present, either declared or in the overflow bag
    pub fn has(&self, field: &str) -> bool {
        (field != RESERVED_FIELD && self.declared.contains_key(field))
            || self.data.contains_key(field)
    }

    /// Declared property names
    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        self.declared.keys().map(String::as_str)
    }

    /// Export all fields
    ///
    /// Declared properties come first, merged with the overflow bag.
    /// Overflow values win on key collision.
    pub fn to_array(&self) -> ValueMap {
        let mut map: ValueMap = self
            .declared
            .iter()
            .filter(|(name, _)| name.as_str() != RESERVED_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for (name, value) in &self.data {
            map.insert(name.clone(), value.clone());
        }
        map
    }

    /// Apply `set` for every entry, in iteration order
    #[allow(clippy::wrong_self_convention)]
    pub fn from_array(&mut self, map: impl IntoIterator<Item = (String, JsonValue)>) {
        for (field, value) in map {
            self.set(&field, value);
        }
    }

    /// Soft-delete the item with a reason
    pub fn mark_invalid(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.invalid_message = message.into();
    }

    /// Restore the default valid state
    pub fn mark_valid(&mut self) {
        self.valid = true;
        self.invalid_message.clear();
    }

    /// Whether the item is valid
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Why the item was marked invalid, empty when valid
    pub fn invalid_message(&self) -> &str {
        &self.invalid_message
    }
}

impl FromIterator<(String, JsonValue)> for Item {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        Self::from_map(iter)
    }
}
