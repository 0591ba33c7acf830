//! Tamper plugin registry
//!
//! Explicit id to factory mapping, populated at startup.

use super::plugins;
use super::types::{ItemUsage, Tamper, TamperDefinition, Tampered};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::types::{JsonValue, OptionStringExt};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Builds a plugin instance from its configuration
pub type TamperFactory = Arc<dyn Fn(&JsonValue) -> Result<Box<dyn Tamper>> + Send + Sync>;

#[derive(Clone)]
struct RegisteredTamper {
    definition: Arc<TamperDefinition>,
    factory: TamperFactory,
}

/// Registry of available tamper plugins
#[derive(Clone, Default)]
pub struct TamperRegistry {
    plugins: IndexMap<String, RegisteredTamper>,
}

impl TamperRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        plugins::register_builtins(&mut registry);
        registry
    }

    /// Register a plugin type
    ///
    /// Rejects empty and duplicate ids.
    pub fn register<F>(&mut self, definition: TamperDefinition, factory: F) -> Result<()>
    where
        F: Fn(&JsonValue) -> Result<Box<dyn Tamper>> + Send + Sync + 'static,
    {
        if definition.id.is_empty() {
            return Err(Error::config("Tamper plugin id cannot be empty"));
        }
        if self.plugins.contains_key(&definition.id) {
            return Err(Error::DuplicatePlugin {
                id: definition.id.clone(),
            });
        }

        self.insert(definition, factory);
        Ok(())
    }

    /// Register without validation, replacing an existing entry
    pub(crate) fn insert<F>(&mut self, definition: TamperDefinition, factory: F)
    where
        F: Fn(&JsonValue) -> Result<Box<dyn Tamper>> + Send + Sync + 'static,
    {
        self.plugins.insert(
            definition.id.clone(),
            RegisteredTamper {
                definition: Arc::new(definition),
                factory: Arc::new(factory),
            },
        );
    }

    /// Whether a plugin id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Definition of a registered plugin
    pub fn definition(&self, id: &str) -> Option<&TamperDefinition> {
        self.plugins.get(id).map(|p| p.definition.as_ref())
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Instantiate a plugin with the given configuration
    pub fn create(&self, id: &str, config: &JsonValue) -> Result<TamperInstance> {
        let registered = self
            .plugins
            .get(id)
            .ok_or_else(|| Error::unknown_plugin(id))?;
        let plugin = (registered.factory)(config)?;

        Ok(TamperInstance {
            definition: Arc::clone(&registered.definition),
            plugin,
            label: None,
        })
    }

    /// Unique categories, sorted case-insensitively
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for registered in self.plugins.values() {
            if !categories.contains(&registered.definition.category) {
                categories.push(registered.definition.category.clone());
            }
        }
        categories.sort_by(|a, b| natural_cmp(a, b));
        categories
    }

    /// Definitions sorted by category, then label
    pub fn sorted_definitions(&self) -> Vec<&TamperDefinition> {
        let mut definitions: Vec<&TamperDefinition> = self
            .plugins
            .values()
            .map(|p| p.definition.as_ref())
            .collect();
        definitions.sort_by(|a, b| {
            natural_cmp(&a.category, &b.category).then_with(|| natural_cmp(&a.label, &b.label))
        });
        definitions
    }

    /// Sorted definitions grouped by category
    pub fn grouped_definitions(&self) -> IndexMap<String, Vec<&TamperDefinition>> {
        let mut grouped: IndexMap<String, Vec<&TamperDefinition>> = IndexMap::new();
        for definition in self.sorted_definitions() {
            grouped
                .entry(definition.category.clone())
                .or_default()
                .push(definition);
        }
        grouped
    }
}

impl fmt::Debug for TamperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TamperRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Case-insensitive comparison that orders digit runs numerically
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_number(&mut left);
                let r_num = take_number(&mut right);
                match l_num.cmp(&r_num) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(l), Some(r)) => {
                left.next();
                right.next();
                match l.cmp(&r) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut number: u64 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        number = number.saturating_mul(10).saturating_add(u64::from(digit));
        chars.next();
    }
    number
}

// ============================================================================
// Plugin Instance
// ============================================================================

/// A configured plugin bound to its static definition
pub struct TamperInstance {
    definition: Arc<TamperDefinition>,
    plugin: Box<dyn Tamper>,
    label: Option<String>,
}

impl TamperInstance {
    /// Override the label used in messages
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.none_if_empty();
        self
    }

    /// Plugin id
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Configured label, falling back to the plugin id
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.definition.id)
    }

    /// Static definition
    pub fn definition(&self) -> &TamperDefinition {
        &self.definition
    }

    /// Whether the plugin accepts a whole collection
    pub fn handles_multiples(&self) -> bool {
        self.definition.handle_multiples
    }

    /// Effective item usage
    pub fn item_usage(&self) -> ItemUsage {
        self.definition.effective_item_usage()
    }

    /// Source properties the plugin reads
    pub fn used_source_properties(&self) -> Vec<String> {
        self.plugin.used_source_properties()
    }

    /// Run the plugin
    ///
    /// Fails up front when the plugin requires an item and none is given.
    pub fn tamper(
        &self,
        data: JsonValue,
        item: Option<&mut dyn TamperableItem>,
    ) -> Result<Tampered> {
        if item.is_none() && self.item_usage().requires_item() {
            return Err(Error::missing_item(self.id()));
        }
        self.plugin.tamper(data, item)
    }
}

impl fmt::Debug for TamperInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TamperInstance")
            .field("id", &self.definition.id)
            .field("label", &self.label)
            .field("plugin", &self.plugin)
            .finish()
    }
}
