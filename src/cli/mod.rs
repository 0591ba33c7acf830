//! CLI module
//!
//! Command-line interface for importing feeds.
//!
//! # Commands
//!
//! - `import` - Import a source in batches, resuming from a state file
//! - `parse` - Print the tampered items of one batch
//! - `plugins` - List the tamper plugins
//! - `validate` - Validate a feed type definition
//! - `template` - Print an empty CSV template
//! - `state` - Show or reset a state file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
