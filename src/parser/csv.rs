//! Delimited text parser
//!
//! Fields opening with a quote may contain delimiters, doubled quotes and
//! line breaks. Quotes anywhere else are kept as text. Rows end with LF or
//! CRLF and blank rows are skipped.

use super::types::{MappingSource, ParserConfig, ParserType};
use super::{ensure_not_empty, finish_batch, strip_line_end, LineReader, Parser, SourceKeys};
use crate::error::Result;
use crate::fetcher::FetcherResult;
use crate::item::Item;
use crate::state::ImportState;
use crate::types::{Delimiter, JsonValue, Severity};
use indexmap::{IndexMap, IndexSet};
use std::io::{BufRead, Seek, SeekFrom};
use tracing::{debug, warn};

/// Parser for comma, semicolon, tab, pipe or plus separated sources
#[derive(Debug, Clone)]
pub struct CsvParser {
    config: ParserConfig,
    keys: SourceKeys,
}

impl CsvParser {
    pub fn new(config: ParserConfig, sources: &IndexMap<String, MappingSource>) -> Self {
        Self {
            keys: SourceKeys::new(ParserType::Csv, sources),
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn delimiter(&self) -> char {
        self.config.delimiter.as_char()
    }

    /// Header line listing the columns of the CSV sources
    ///
    /// Names containing the delimiter are quoted. Blank names and
    /// duplicates are left out.
    pub fn template_contents(&self) -> String {
        let delimiter = self.delimiter();
        let mut columns: IndexSet<String> = IndexSet::new();

        for column in self.keys.columns() {
            let column = if column.contains(delimiter) {
                format!("\"{}\"", column.replace('"', "\"\""))
            } else {
                column.to_string()
            };
            if !column.trim().is_empty() {
                columns.insert(column);
            }
        }

        let mut contents = columns
            .into_iter()
            .collect::<Vec<_>>()
            .join(&delimiter.to_string());
        contents.push('\n');
        contents
    }

    /// File extension and MIME type for a template
    pub fn template_file_details(&self) -> (&'static str, &'static str) {
        match self.config.delimiter {
            Delimiter::Tab => ("tsv", "text/tab-separated-values"),
            _ => ("csv", "text/csv"),
        }
    }

    /// Build an item from one row
    fn item(&self, header: &[String], row: Vec<String>) -> Item {
        let mut item = Item::new();
        for (delta, cell) in row.into_iter().enumerate() {
            let index;
            let key = match header.get(delta) {
                Some(name) => name.as_str(),
                None => {
                    index = delta.to_string();
                    index.as_str()
                }
            };
            if let Some(key) = self.keys.resolve(key) {
                item.set(key, JsonValue::String(cell));
            }
        }
        item
    }
}

impl Parser for CsvParser {
    fn parser_type(&self) -> ParserType {
        ParserType::Csv
    }

    fn parse(&self, result: &FetcherResult, state: &mut ImportState) -> Result<Vec<Item>> {
        let size = ensure_not_empty(result)?;
        let delimiter = self.delimiter();

        let mut reader = LineReader::new(result.reader()?, 0);
        let header = if self.config.no_headers {
            Vec::new()
        } else {
            next_record(&mut reader, delimiter, state)?.unwrap_or_default()
        };

        let mut reader = if state.pointer > reader.position() {
            let mut source = result.reader()?;
            source.seek(SeekFrom::Start(state.pointer))?;
            LineReader::new(source, state.pointer)
        } else {
            reader
        };

        let mut items = Vec::new();
        while items.len() < self.config.line_limit {
            let Some(row) = next_record(&mut reader, delimiter, state)? else {
                break;
            };
            items.push(self.item(&header, row));
        }

        debug!(
            items = items.len(),
            from = state.pointer,
            to = reader.position(),
            size,
            "Parsed CSV batch"
        );
        finish_batch(state, size, reader.position(), items.len());
        Ok(items)
    }
}

/// Read the next non-blank record, joining lines while a quoted field is open
///
/// Rows that are not valid UTF-8 are decoded lossily and queue a warning.
fn next_record<R: BufRead>(
    reader: &mut LineReader<R>,
    delimiter: char,
    state: &mut ImportState,
) -> Result<Option<Vec<String>>> {
    let mut record = Vec::new();
    let mut fields = None;
    let mut offset = reader.position();
    loop {
        let start = record.len();
        if reader.read_line(&mut record)? == 0 {
            break;
        }
        if start == 0 && strip_line_end(&record).is_empty() {
            record.clear();
            offset = reader.position();
            continue;
        }
        let text = String::from_utf8_lossy(strip_line_end(&record));
        let (split, open) = split_record(&text, delimiter);
        fields = Some(split);
        if !open {
            break;
        }
    }

    if fields.is_some() && std::str::from_utf8(&record).is_err() {
        warn!(offset, "Invalid UTF-8 in row");
        state.set_message(
            format!("The row at byte {offset} is not valid UTF-8, invalid bytes were replaced"),
            Severity::Warning,
            true,
        );
    }
    Ok(fields)
}

/// Split one record into fields
pub(super) fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    split_record(line, delimiter).0
}

/// Fields of a record and whether a quoted field is still open at its end
///
/// Only a `"` opening a field starts quoting, other quotes are literal.
fn split_record(line: &str, delimiter: char) -> (Vec<String>, bool) {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                current.push(c);
            } else if chars.peek() == Some(&'"') {
                // Doubled quote inside a quoted field
                current.push('"');
                chars.next();
            } else {
                in_quotes = false;
            }
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
            field_start = true;
        } else if c == '"' && field_start {
            in_quotes = true;
            field_start = false;
        } else {
            current.push(c);
            field_start = false;
        }
    }

    fields.push(current);
    (fields, in_quotes)
}
