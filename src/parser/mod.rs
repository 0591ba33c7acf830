//! Parser module
//!
//! Turns fetched content into items, one bounded batch per call.
//!
//! # Overview
//!
//! - `Parser` - Trait implemented by every parser
//! - `CsvParser` - Delimited text with optional header row and templates
//! - `JsonLinesParser` - One JSON object per line
//! - `ParserConfig` / `MappingSource` - Feed type settings the parsers read
//!
//! Parsers resume from `ImportState::pointer`, a byte offset into the
//! source. After every call the pointer sits right after the last record
//! consumed, `total` holds the source size and `progress` is updated from
//! both. A call that yields nothing marks the state complete.

mod csv;
mod jsonl;
mod types;

pub use self::csv::CsvParser;
pub use jsonl::JsonLinesParser;
pub use types::{MappingSource, ParserConfig, ParserType, DEFAULT_LINE_LIMIT};

use crate::error::{Error, Result};
use crate::fetcher::FetcherResult;
use crate::item::Item;
use crate::state::ImportState;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::io::BufRead;
use std::sync::Arc;

/// Parses one batch of items from fetched content
pub trait Parser: Send + Sync + std::fmt::Debug {
    /// Parser type tag
    fn parser_type(&self) -> ParserType;

    /// Parse the next batch, resuming from the state pointer
    fn parse(&self, result: &FetcherResult, state: &mut ImportState) -> Result<Vec<Item>>;
}

/// Build the parser for a configuration
pub fn create_parser(
    config: &ParserConfig,
    sources: &IndexMap<String, MappingSource>,
) -> Arc<dyn Parser> {
    match config.kind {
        ParserType::Csv => Arc::new(CsvParser::new(config.clone(), sources)),
        ParserType::Jsonl => Arc::new(JsonLinesParser::new(config.clone(), sources)),
    }
}

// ============================================================================
// Source Keys
// ============================================================================

/// How raw field names map to source names for one parser
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceKeys {
    /// Raw column name to source machine name
    renames: IndexMap<String, String>,
    /// Sources that belong to another parser type
    skipped: HashSet<String>,
}

impl SourceKeys {
    pub(crate) fn new(parser: ParserType, sources: &IndexMap<String, MappingSource>) -> Self {
        let mut keys = Self::default();
        for (name, source) in sources {
            if !source.belongs_to(parser) {
                keys.skipped.insert(name.clone());
                continue;
            }
            if let Some(column) = source.column() {
                keys.renames.insert(column.to_string(), name.clone());
            }
        }
        keys
    }

    /// The source name for a raw key, `None` when the key is skipped
    pub(crate) fn resolve<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if self.skipped.contains(key) {
            return None;
        }
        Some(self.renames.get(key).map_or(key, String::as_str))
    }

    /// Columns of this parser's sources keyed by machine name
    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.renames.keys().map(String::as_str)
    }
}

// ============================================================================
// Line Reading
// ============================================================================

/// Reads lines from a byte offset, tracking the position reached
pub(crate) struct LineReader<R> {
    reader: R,
    position: u64,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R, position: u64) -> Self {
        Self { reader, position }
    }

    /// Offset right after the last byte consumed
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Append the next line, terminator included, returning its length
    pub(crate) fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let read = self.reader.read_until(b'\n', buf)?;
        self.position += read as u64;
        Ok(read)
    }
}

/// Drop one trailing `\n` and one trailing `\r`
pub(crate) fn strip_line_end(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

/// Fail on empty content, before any batch is attempted
pub(crate) fn ensure_not_empty(result: &FetcherResult) -> Result<u64> {
    let size = result.size()?;
    if size == 0 {
        return Err(Error::EmptyFeed);
    }
    Ok(size)
}

/// Record the position reached and complete the state on an empty batch
pub(crate) fn finish_batch(state: &mut ImportState, size: u64, position: u64, parsed: usize) {
    state.total = size;
    state.pointer = position;
    state.progress(size, position);
    if parsed == 0 {
        state.set_completed();
    }
}

#[cfg(test)]
mod tests;
