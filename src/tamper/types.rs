//! Tamper plugin types
//!
//! Static plugin metadata and the runtime contract every plugin implements.

use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Item Usage
// ============================================================================

/// How much a plugin needs the carrier item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemUsage {
    /// The plugin fails without an item
    Required,
    /// The plugin may read the item when one is given
    #[default]
    Optional,
    /// The plugin never touches the item
    Ignored,
}

impl ItemUsage {
    /// Parse a declared usage, rejecting unknown values
    ///
    /// `None` means the plugin did not declare a usage.
    pub fn parse(plugin: &str, value: Option<&str>) -> Result<Option<Self>> {
        match value {
            None => Ok(None),
            Some("required") => Ok(Some(ItemUsage::Required)),
            Some("optional") => Ok(Some(ItemUsage::Optional)),
            Some("ignored") => Ok(Some(ItemUsage::Ignored)),
            Some(other) => Err(Error::InvalidItemUsage {
                plugin: plugin.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Whether the plugin cannot work without an item
    pub fn requires_item(self) -> bool {
        self == ItemUsage::Required
    }

    /// Whether the plugin reads the item at all
    pub fn uses_item(self) -> bool {
        self != ItemUsage::Ignored
    }

    /// Whether the plugin never touches the item
    pub fn ignores_item(self) -> bool {
        self == ItemUsage::Ignored
    }
}

impl fmt::Display for ItemUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemUsage::Required => "required",
            ItemUsage::Optional => "optional",
            ItemUsage::Ignored => "ignored",
        })
    }
}

// ============================================================================
// Plugin Definition
// ============================================================================

/// Static metadata of a tamper plugin type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperDefinition {
    /// Plugin id
    pub id: String,
    /// Human readable label
    pub label: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category used for grouping
    #[serde(default = "default_category")]
    pub category: String,
    /// Whether the plugin accepts a whole collection
    #[serde(default)]
    pub handle_multiples: bool,
    /// Declared item usage, `None` when unspecified
    #[serde(default)]
    pub item_usage: Option<ItemUsage>,
}

fn default_category() -> String {
    "Other".to_string()
}

impl TamperDefinition {
    /// Create a definition in the default category
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            category: default_category(),
            handle_multiples: false,
            item_usage: None,
        }
    }

    /// Set the category
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the plugin as accepting whole collections
    #[must_use]
    pub fn handle_multiples(mut self) -> Self {
        self.handle_multiples = true;
        self
    }

    /// Declare the item usage
    #[must_use]
    pub fn item_usage(mut self, usage: ItemUsage) -> Self {
        self.item_usage = Some(usage);
        self
    }

    /// Declare the item usage from its textual form
    pub fn item_usage_str(mut self, usage: Option<&str>) -> Result<Self> {
        self.item_usage = ItemUsage::parse(&self.id, usage)?;
        Ok(self)
    }

    /// The declared usage, falling back to optional
    pub fn effective_item_usage(&self) -> ItemUsage {
        self.item_usage.unwrap_or_default()
    }
}

// ============================================================================
// Plugin Contract
// ============================================================================

/// Outcome of a single tamper call
#[derive(Debug, Clone, PartialEq)]
pub enum Tampered {
    /// The transformed value
    Value(JsonValue),
    /// Abandon this field's value for the current item
    SkipData,
    /// Abandon the whole item
    SkipItem,
}

/// A configured value transformation
///
/// Implementations are stateless across items. Configuration is applied
/// once, when the registry builds the instance.
pub trait Tamper: Send + Sync + fmt::Debug {
    /// Transform a value, optionally reading or writing the carrier item
    fn tamper(&self, data: JsonValue, item: Option<&mut dyn TamperableItem>) -> Result<Tampered>;

    /// Source properties of the item this plugin reads
    fn used_source_properties(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Deserialize plugin settings from a JSON configuration map
///
/// A null configuration yields the settings' defaults.
pub fn settings<T: DeserializeOwned + Default>(plugin: &str, config: &JsonValue) -> Result<T> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone())
        .map_err(|e| Error::invalid_value(plugin, format!("invalid settings: {e}")))
}
