//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::error::{Error, Result, ResultExt};
use crate::fetcher::fetcher_for;
use crate::import::Importer;
use crate::item::Item;
use crate::loader::{load_feed_type, validate_tampers, FeedTypeDefinition};
use crate::parser::{CsvParser, ParserType};
use crate::processor::{ItemProcessor, MemoryProcessor};
use crate::state::{FeedState, ImportState, StateManager};
use crate::tamper::TamperRegistry;
use serde_json::{json, Value};
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
    registry: TamperRegistry,
}

impl Runner {
    /// Create a new runner with the built-in plugins
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            registry: TamperRegistry::with_builtins(),
        }
    }

    /// Use a custom plugin registry
    #[must_use]
    pub fn with_registry(mut self, registry: TamperRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Import {
                source,
                output,
                max_batches,
                reset,
            } => {
                self.import(source, output.as_deref(), *max_batches, *reset)
                    .await
            }
            Commands::Parse { source } => self.parse(source).await,
            Commands::Plugins => self.plugins(),
            Commands::Validate => self.validate(),
            Commands::Template => self.template(),
            Commands::State { reset } => self.state(*reset).await,
        }
    }

    /// Load feed type definition
    fn load_feed_type(&self) -> Result<FeedTypeDefinition> {
        let path = self
            .cli
            .feed_type
            .as_ref()
            .ok_or_else(|| Error::config("Feed type file not specified (use -f flag)"))?;
        load_feed_type(path)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Import a source
    async fn import(
        &self,
        source: &str,
        output: Option<&Path>,
        max_batches: Option<u64>,
        reset: bool,
    ) -> Result<()> {
        let feed_type = self.load_feed_type()?;
        let manager = self.load_state()?;
        if reset {
            manager.clear().await?;
        }

        let mut state = manager.snapshot().await;
        if state.feed.is_empty() {
            state.feed = feed_type.name.clone();
        } else if state.feed != feed_type.name {
            return Err(Error::state(format!(
                "State file belongs to feed type '{}', not '{}'",
                state.feed, feed_type.name
            )));
        }

        let mut processor = MemoryProcessor::new(feed_type.mappings.clone());
        if let Some(path) = output {
            processor
                .load_jsonl(path)
                .with_context(|| format!("Failed to load entity store '{}'", path.display()))?;
        }

        let mut importer =
            Importer::new(feed_type, &self.registry)?.with_state_manager(manager.clone());

        let summary = match importer
            .import_all(source, &mut state, &mut processor, max_batches)
            .await
        {
            Ok(summary) => summary,
            Err(Error::EmptyFeed) => {
                self.output_message(&json!({
                    "type": "LOG",
                    "log": { "level": "WARN", "message": Error::EmptyFeed.to_string() }
                }));
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Some(path) = output {
            processor
                .write_jsonl(path)
                .with_context(|| format!("Failed to write entity store '{}'", path.display()))?;
        }

        self.output_message(&json!({
            "type": "IMPORT",
            "import": {
                "feed": state.feed,
                "source": source,
                "batches": summary.batches,
                "parsed": summary.parsed,
                "kept": summary.kept,
                "complete": summary.complete,
                "progress": state.parse.progress,
                "skipped_by_tampers": state.parse.skipped,
                "counters": counters(&state.process),
            }
        }));

        Ok(())
    }

    /// Parse and tamper a single batch
    async fn parse(&self, source: &str) -> Result<()> {
        let feed_type = self.load_feed_type()?;
        let fetcher = fetcher_for(source, &feed_type.http)?;
        let mut state = FeedState::new(&feed_type.name).with_source(source);
        let result = fetcher.fetch(source, &mut state.fetch).await?;

        let mut importer = Importer::new(feed_type, &self.registry)?;
        let mut items = CollectItems::default();
        let report = importer
            .import_batch(&mut state, &result, &mut items)
            .await?;

        for item in &items.0 {
            self.output_message(&json!({
                "type": "ITEM",
                "item": item.to_array(),
                "valid": item.is_valid(),
            }));
        }
        self.output_message(&json!({
            "type": "BATCH",
            "batch": {
                "parsed": report.parsed,
                "kept": report.kept,
                "complete": report.complete,
                "messages": report.messages,
            }
        }));

        result.clean_up();
        Ok(())
    }

    /// List plugins grouped by category
    fn plugins(&self) -> Result<()> {
        let categories: Vec<Value> = self
            .registry
            .grouped_definitions()
            .into_iter()
            .map(|(category, definitions)| {
                let plugins: Vec<Value> = definitions
                    .into_iter()
                    .map(|definition| {
                        json!({
                            "id": definition.id,
                            "label": definition.label,
                            "description": definition.description,
                            "handle_multiples": definition.handle_multiples,
                            "item_usage": definition.effective_item_usage(),
                        })
                    })
                    .collect();
                json!({ "category": category, "plugins": plugins })
            })
            .collect();

        self.output_message(&json!({
            "type": "PLUGINS",
            "plugins": categories
        }));

        Ok(())
    }

    /// Validate feed type definition
    fn validate(&self) -> Result<()> {
        let feed_type = self.load_feed_type()?;
        let chains = validate_tampers(&feed_type, &self.registry)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Feed type '{}' is valid with {} sources, {} tamper chains and {} mappings",
                    feed_type.name,
                    feed_type.sources.len(),
                    chains.len(),
                    feed_type.mappings.len()
                )
            }
        }));

        Ok(())
    }

    /// Print a CSV template
    fn template(&self) -> Result<()> {
        let feed_type = self.load_feed_type()?;
        if feed_type.parser.kind != ParserType::Csv {
            return Err(Error::config(format!(
                "Templates are only available for CSV feed types, '{}' uses {}",
                feed_type.name, feed_type.parser.kind
            )));
        }

        let parser = CsvParser::new(feed_type.parser.clone(), &feed_type.sources);
        print!("{}", parser.template_contents());
        Ok(())
    }

    /// Show or reset the state file
    async fn state(&self, reset: bool) -> Result<()> {
        if self.cli.state.is_none() {
            return Err(Error::config("State file not specified (use --state flag)"));
        }

        let manager = self.load_state()?;
        if reset {
            manager.clear().await?;
        }

        let state = manager.snapshot().await;
        self.output_message(&json!({
            "type": "STATE",
            "state": state,
            "complete": state.is_completed(),
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Keeps the items of a batch for printing
#[derive(Default)]
struct CollectItems(Vec<Item>);

impl ItemProcessor for CollectItems {
    fn process(&mut self, items: Vec<Item>, _state: &mut ImportState) -> Result<()> {
        self.0.extend(items);
        Ok(())
    }
}

fn counters(state: &ImportState) -> Value {
    json!({
        "created": state.created,
        "updated": state.updated,
        "skipped": state.skipped,
        "failed": state.failed,
    })
}
