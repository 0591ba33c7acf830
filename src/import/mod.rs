//! Import driver module
//!
//! Runs a feed type over a source one batch at a time.
//!
//! # Overview
//!
//! The import module provides:
//! - `Importer` - Fetch, parse a batch, tamper, process, checkpoint
//! - `BatchReport` - What one batch did
//! - `ImportSummary` - Totals over a run of batches
//!
//! All progress lives in a `FeedState`. It is checkpointed through a
//! `StateManager` after every batch, so a later process can resume from the
//! parser's pointer.

mod types;

pub use types::{BatchReport, ImportSummary};

use crate::error::{Error, Result};
use crate::fetcher::{fetcher_for, FetcherResult};
use crate::loader::{validate_tampers, FeedTypeDefinition};
use crate::parser::{create_parser, Parser};
use crate::pipeline::{ContextSource, RunContext, SourceProvider, TamperPipeline};
use crate::processor::ItemProcessor;
use crate::state::{FeedState, StateManager};
use crate::tamper::TamperRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the import of one feed type
#[derive(Debug)]
pub struct Importer {
    feed_type: FeedTypeDefinition,
    parser: Arc<dyn Parser>,
    pipeline: TamperPipeline,
    state_manager: Option<StateManager>,
}

impl Importer {
    /// Build the parser and tamper chains of a feed type
    ///
    /// Fails when a tamper plugin is unknown to the registry or rejects its
    /// configuration. Sources using a `feed_name` or `feed_source` provider
    /// are wired up straight away.
    pub fn new(feed_type: FeedTypeDefinition, registry: &TamperRegistry) -> Result<Self> {
        let parser = create_parser(&feed_type.parser, &feed_type.sources);
        let mut pipeline = TamperPipeline::new(validate_tampers(&feed_type, registry)?);

        for (source, provider) in feed_type.provided_sources() {
            if let Some(context_source) = ContextSource::from_name(provider) {
                pipeline = pipeline.with_provider(source, Arc::new(context_source));
            }
        }

        Ok(Self {
            feed_type,
            parser,
            pipeline,
            state_manager: None,
        })
    }

    /// Register a provider for every source that names it
    #[must_use]
    pub fn with_source_provider(
        mut self,
        name: &str,
        provider: Arc<dyn SourceProvider>,
    ) -> Self {
        let sources: Vec<String> = self
            .feed_type
            .provided_sources()
            .filter(|(_, provider_name)| *provider_name == name)
            .map(|(source, _)| source.to_string())
            .collect();

        for source in sources {
            self.pipeline = self.pipeline.with_provider(source, Arc::clone(&provider));
        }
        self
    }

    /// Checkpoint the feed state after every batch
    #[must_use]
    pub fn with_state_manager(mut self, manager: StateManager) -> Self {
        self.state_manager = Some(manager);
        self
    }

    pub fn feed_type(&self) -> &FeedTypeDefinition {
        &self.feed_type
    }

    pub fn parser(&self) -> &dyn Parser {
        self.parser.as_ref()
    }

    pub fn pipeline(&self) -> &TamperPipeline {
        &self.pipeline
    }

    /// Run one batch over fetched content
    ///
    /// Parses the next batch into the parse stage, tampers the items and
    /// hands the survivors to the processor, which reports on the process
    /// stage. An empty source completes the parse stage and fails with
    /// `Error::EmptyFeed`.
    pub async fn import_batch(
        &mut self,
        state: &mut FeedState,
        result: &FetcherResult,
        processor: &mut dyn ItemProcessor,
    ) -> Result<BatchReport> {
        self.check_providers()?;

        let mut context = RunContext::new(&self.feed_type.name);
        if let Some(source) = &state.source {
            context = context.with_source(source);
        }
        self.pipeline.set_context(context);

        let items = match self.parser.parse(result, &mut state.parse) {
            Ok(items) => items,
            Err(Error::EmptyFeed) => {
                warn!(feed = %self.feed_type.name, "The feed is empty");
                state.parse.set_completed();
                state.process.set_completed();
                self.checkpoint(state).await?;
                return Err(Error::EmptyFeed);
            }
            Err(e) => return Err(e),
        };

        let parsed = items.len();
        let items = self.pipeline.process(items, &mut state.parse);
        let kept = items.len();

        if !items.is_empty() {
            processor.process(items, &mut state.process)?;
        }

        state.batches += 1;
        if state.parse.is_completed() {
            state.process.set_completed();
        } else {
            state.process.progress(state.parse.total, state.parse.pointer);
        }

        state.parse.log_messages(&self.feed_type.name);
        state.process.log_messages(&self.feed_type.name);
        let mut messages = state.parse.take_messages();
        messages.extend(state.process.take_messages());

        let complete = state.is_completed();
        info!(
            feed = %self.feed_type.name,
            batch = state.batches,
            parsed,
            kept,
            complete,
            "Imported batch"
        );

        self.checkpoint(state).await?;

        Ok(BatchReport {
            parsed,
            kept,
            complete,
            messages,
        })
    }

    /// Fetch a source and import batches until it is complete
    ///
    /// A state whose recorded source differs from `source` is reset first.
    /// Stops early after `max_batches` batches when a limit is given; the
    /// state then holds the pointer to resume from.
    pub async fn import_all(
        &mut self,
        source: &str,
        state: &mut FeedState,
        processor: &mut dyn ItemProcessor,
        max_batches: Option<u64>,
    ) -> Result<ImportSummary> {
        if state.source.as_deref() != Some(source) {
            if state.batches > 0 {
                debug!(previous = ?state.source, %source, "Source changed, resetting state");
            }
            state.reset();
            state.source = Some(source.to_string());
        }
        if state.feed.is_empty() {
            state.feed = self.feed_type.name.clone();
        }

        let mut summary = ImportSummary::default();
        if state.is_completed() && state.batches > 0 {
            info!(feed = %self.feed_type.name, "Import already complete");
            summary.complete = true;
            return Ok(summary);
        }

        let fetcher = fetcher_for(source, &self.feed_type.http)?;
        let result = fetcher.fetch(source, &mut state.fetch).await?;

        loop {
            if max_batches.is_some_and(|max| summary.batches >= max) {
                debug!(batches = summary.batches, "Batch limit reached");
                break;
            }

            let report = self.import_batch(state, &result, processor).await?;
            summary.add_batch(&report);
            if report.complete {
                break;
            }
        }

        result.clean_up();
        Ok(summary)
    }

    /// Fail when a source names a provider nobody registered
    fn check_providers(&self) -> Result<()> {
        for (source, provider) in self.feed_type.provided_sources() {
            if !self.pipeline.has_provider(source) {
                return Err(Error::invalid_value(
                    format!("sources.{source}.provider"),
                    format!("unknown source provider '{provider}'"),
                ));
            }
        }
        Ok(())
    }

    async fn checkpoint(&self, state: &FeedState) -> Result<()> {
        if let Some(manager) = &self.state_manager {
            manager.update(state.clone()).await?;
        }
        Ok(())
    }
}
