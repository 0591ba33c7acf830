//! Pipeline module
//!
//! Applies the tamper chains of a feed type to parsed items.
//!
//! # Overview
//!
//! - `TamperPipeline` - Runs every source's chain over every item
//! - `SourceProvider` - Loads sources a plugin reads but the parser did not produce
//! - `RunContext` - Feed details handed to source providers
//!
//! Per source the running value starts as the item's current value. Before
//! each plugin the pipeline checks whether that value is a non-empty list:
//! if so and the plugin does not handle multiples, the plugin runs once per
//! element. The value is written back to the item after every plugin so
//! later plugins see it.
//!
//! `Tampered::SkipData` nulls the source and stops its chain.
//! `Tampered::SkipItem` drops the item. Any plugin error is turned into a
//! warning on the state and marks the item invalid; processing carries on
//! with the next source.

mod provider;

pub use provider::{ConstantSource, ContextSource, RunContext, SourceProvider};

use crate::error::{Error, Result};
use crate::item::{Item, TamperableItem};
use crate::state::ImportState;
use crate::tamper::{TamperChains, TamperInstance, Tampered};
use crate::types::{value_is_empty, JsonValue, ReportCode, Severity};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to an item in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Kept,
    Skipped,
}

/// How one source's chain ended
enum ChainEnd {
    Done,
    SkipItem,
}

/// A plugin failure, with the label of the plugin that raised it
struct ChainFailure {
    label: String,
    error: Error,
}

/// Tamper chains plus the collaborators they need at run time
pub struct TamperPipeline {
    chains: TamperChains,
    /// Providers keyed by the source property they load
    providers: IndexMap<String, Arc<dyn SourceProvider>>,
    context: RunContext,
}

impl TamperPipeline {
    pub fn new(chains: TamperChains) -> Self {
        Self {
            chains,
            providers: IndexMap::new(),
            context: RunContext::default(),
        }
    }

    /// Set the context handed to source providers
    #[must_use]
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = context;
        self
    }

    /// Load a source property on demand
    #[must_use]
    pub fn with_provider(
        mut self,
        source: impl Into<String>,
        provider: Arc<dyn SourceProvider>,
    ) -> Self {
        self.providers.insert(source.into(), provider);
        self
    }

    /// Replace the context between batches
    pub fn set_context(&mut self, context: RunContext) {
        self.context = context;
    }

    /// Whether a provider loads this source
    pub fn has_provider(&self, source: &str) -> bool {
        self.providers.contains_key(source)
    }

    pub fn chains(&self) -> &TamperChains {
        &self.chains
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Tamper every item, dropping the ones a plugin skipped
    pub fn process(&self, items: Vec<Item>, state: &mut ImportState) -> Vec<Item> {
        if self.chains.is_empty() {
            return items;
        }

        let parsed = items.len();
        let kept: Vec<Item> = items
            .into_iter()
            .filter_map(|mut item| match self.alter_item(&mut item, state) {
                ItemOutcome::Kept => Some(item),
                ItemOutcome::Skipped => None,
            })
            .collect();

        debug!(parsed, kept = kept.len(), "Applied tamper chains");
        kept
    }

    /// Run every chain over one item
    pub fn alter_item(&self, item: &mut Item, state: &mut ImportState) -> ItemOutcome {
        let mut loaded = HashSet::new();

        for (source, chain) in self.chains.iter() {
            match self.run_chain(item, source, &chain, &mut loaded) {
                Ok(ChainEnd::Done) => {}
                Ok(ChainEnd::SkipItem) => {
                    state.report(
                        ReportCode::Skipped,
                        format!("Item skipped while tampering source {source}"),
                    );
                    return ItemOutcome::Skipped;
                }
                Err(ChainFailure { label, error }) => {
                    warn!(%source, tamper = %label, error = %error, "Tampering failed");
                    state.set_message(
                        format!(
                            "Tampering failed for source {source} when trying to applying the tamper {label}: {error}"
                        ),
                        Severity::Warning,
                        false,
                    );
                    item.mark_invalid(format!(
                        "Applying tamper \"{label}\" on source \"{source}\" failed with the error \"{error}\"."
                    ));
                }
            }
        }

        ItemOutcome::Kept
    }

    fn run_chain(
        &self,
        item: &mut Item,
        source: &str,
        chain: &[&TamperInstance],
        loaded: &mut HashSet<String>,
    ) -> std::result::Result<ChainEnd, ChainFailure> {
        let mut value = item.get(source).clone();

        for tamper in chain {
            let fail = |error| ChainFailure {
                label: tamper.label().to_string(),
                error,
            };

            self.load_sources(item, tamper, loaded).map_err(fail)?;

            let outcome = match value {
                JsonValue::Array(values) if !values.is_empty() && !tamper.handles_multiples() => {
                    fan_out(tamper, values, item).map_err(fail)?
                }
                single => invoke(tamper, single, item).map_err(fail)?,
            };

            match outcome {
                Tampered::Value(new_value) => {
                    item.set(source, new_value.clone());
                    value = new_value;
                }
                Tampered::SkipData => {
                    item.set(source, JsonValue::Null);
                    return Ok(ChainEnd::Done);
                }
                Tampered::SkipItem => return Ok(ChainEnd::SkipItem),
            }
        }

        Ok(ChainEnd::Done)
    }

    /// Load the sources a plugin reads that the item does not hold yet
    fn load_sources(
        &self,
        item: &mut Item,
        tamper: &TamperInstance,
        loaded: &mut HashSet<String>,
    ) -> Result<()> {
        if self.providers.is_empty() || tamper.item_usage().ignores_item() {
            return Ok(());
        }

        for property in tamper.used_source_properties() {
            let Some(provider) = self.providers.get(&property) else {
                continue;
            };
            if loaded.contains(&property) || !value_is_empty(item.get(&property)) {
                continue;
            }

            let value = provider.source_element(&self.context, item)?;
            debug!(%property, "Loaded source on demand");
            item.set(&property, value);
            loaded.insert(property);
        }
        Ok(())
    }
}

impl fmt::Debug for TamperPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TamperPipeline")
            .field("chains", &self.chains)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("context", &self.context)
            .finish()
    }
}

/// Call a plugin, handing it the item unless it ignores items
fn invoke(tamper: &TamperInstance, data: JsonValue, item: &mut Item) -> Result<Tampered> {
    if tamper.item_usage().ignores_item() {
        return tamper.tamper(data, None);
    }
    let item: &mut dyn TamperableItem = item;
    tamper.tamper(data, Some(item))
}

/// Run a plugin on each element of a list
///
/// The first skip outcome applies to the whole value.
fn fan_out(tamper: &TamperInstance, values: Vec<JsonValue>, item: &mut Item) -> Result<Tampered> {
    let mut results = Vec::with_capacity(values.len());
    for element in values {
        match invoke(tamper, element, item)? {
            Tampered::Value(value) => results.push(value),
            skip => return Ok(skip),
        }
    }
    Ok(Tampered::Value(JsonValue::Array(results)))
}
