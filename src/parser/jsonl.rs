//! JSON lines parser

use super::types::{MappingSource, ParserConfig, ParserType};
use super::{ensure_not_empty, finish_batch, strip_line_end, LineReader, Parser, SourceKeys};
use crate::error::{Error, Result};
use crate::fetcher::FetcherResult;
use crate::item::Item;
use crate::state::ImportState;
use crate::types::{JsonValue, ReportCode, Severity};
use indexmap::IndexMap;
use std::io::{Seek, SeekFrom};
use tracing::{debug, warn};

/// Parser for sources holding one JSON object per line
///
/// Top level keys become item fields, renamed through the mapping sources.
/// Blank lines are skipped. Lines that are not a JSON object are reported
/// as failed and count towards the line limit.
#[derive(Debug, Clone)]
pub struct JsonLinesParser {
    config: ParserConfig,
    keys: SourceKeys,
}

impl JsonLinesParser {
    pub fn new(config: ParserConfig, sources: &IndexMap<String, MappingSource>) -> Self {
        Self {
            keys: SourceKeys::new(ParserType::Jsonl, sources),
            config,
        }
    }

    fn item(&self, line: &[u8], offset: u64) -> Result<Item> {
        let value: JsonValue = serde_json::from_slice(line)
            .map_err(|e| Error::decode(format!("invalid JSON at byte {offset}: {e}")))?;
        let JsonValue::Object(object) = value else {
            return Err(Error::decode(format!(
                "expected a JSON object at byte {offset}"
            )));
        };

        let mut item = Item::new();
        for (key, value) in object {
            if let Some(key) = self.keys.resolve(&key) {
                item.set(key, value);
            }
        }
        Ok(item)
    }
}

impl Parser for JsonLinesParser {
    fn parser_type(&self) -> ParserType {
        ParserType::Jsonl
    }

    fn parse(&self, result: &FetcherResult, state: &mut ImportState) -> Result<Vec<Item>> {
        let size = ensure_not_empty(result)?;

        let mut source = result.reader()?;
        source.seek(SeekFrom::Start(state.pointer))?;
        let mut reader = LineReader::new(source, state.pointer);

        let mut items = Vec::new();
        let mut rows = 0;
        let mut line = Vec::new();
        while rows < self.config.line_limit {
            line.clear();
            let offset = reader.position();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let content = strip_line_end(&line);
            if content.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            rows += 1;
            match self.item(content, offset) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(offset, error = %e, "Skipping malformed line");
                    let message = format!("Skipped line: {e}");
                    state.set_message(message.clone(), Severity::Warning, true);
                    state.report(ReportCode::Failed, message);
                }
            }
        }

        debug!(
            items = items.len(),
            from = state.pointer,
            to = reader.position(),
            size,
            "Parsed JSON lines batch"
        );
        finish_batch(state, size, reader.position(), rows);
        Ok(items)
    }
}
