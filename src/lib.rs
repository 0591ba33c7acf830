// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Feed Tamper
//!
//! Batched, resumable feed imports with configurable value transformations.
//!
//! ## Features
//!
//! - **Resumable Parsing**: CSV and JSON lines sources read in batches from a byte pointer
//! - **Tamper Chains**: Per-source plugin chains ordered by weight, with list fan-out
//! - **Lazy Sources**: Values loaded on demand when a plugin reads them
//! - **Persistent State**: Progress, counters and messages checkpointed between batches
//! - **YAML Feed Types**: Parser, sources, tampers and mappings in one file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feed_tamper::{load_feed_type, FeedState, FetcherResult, Importer, MemoryProcessor, TamperRegistry};
//!
//! #[tokio::main]
//! async fn main() -> feed_tamper::Result<()> {
//!     let feed_type = load_feed_type("feeds/articles.yaml")?;
//!     let mut processor = MemoryProcessor::new(feed_type.mappings.clone());
//!     let mut importer = Importer::new(feed_type, &TamperRegistry::with_builtins())?;
//!
//!     let mut state = FeedState::new("articles");
//!     let summary = importer
//!         .import_all("data/articles.csv", &mut state, &mut processor, None)
//!         .await?;
//!     println!("{} items in {} batches", summary.kept, summary.batches);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Fetcher  │──▶│  Parser  │──▶│ TamperPipeline│──▶│  Processor  │
//! │ file/HTTP│   │ CSV/JSONL│   │ chains+sources│   │ create/update│
//! └──────────┘   └────┬─────┘   └───────┬───────┘   └──────┬──────┘
//!                     │ pointer         │ skipped/warnings │ counters
//!                     └─────────────────┴──────────────────┘
//!                                 FeedState / StateManager
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and value helpers
pub mod types;

/// The record flowing through the pipeline
pub mod item;

/// Tamper plugins, registry and chains
pub mod tamper;

/// Progress tracking and checkpointing
pub mod state;

/// Local and HTTP source fetchers
pub mod fetcher;

/// Resumable batch parsers
pub mod parser;

/// Applies tamper chains to parsed items
pub mod pipeline;

/// Item sinks
pub mod processor;

/// YAML loader for feed type definitions
pub mod loader;

/// Batch import driver
pub mod import;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use fetcher::FetcherResult;
pub use import::{BatchReport, ImportSummary, Importer};
pub use item::Item;
pub use loader::{load_feed_type, load_feed_type_from_str, FeedTypeDefinition};
pub use processor::{ItemProcessor, MemoryProcessor};
pub use state::{FeedState, ImportState, StateManager};
pub use tamper::{TamperRegistry, Tampered};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
