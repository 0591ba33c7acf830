//! In-memory entity store

use super::{ItemProcessor, Mapping};
use crate::error::{Error, Result};
use crate::item::Item;
use crate::state::ImportState;
use crate::types::{value_is_empty, ReportCode, Severity, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// A stored entity
///
/// Fields stay nested so a source named `id` cannot clash with the entity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    #[serde(default)]
    pub fields: ValueMap,
}

/// Stores entities in memory, matching existing ones on unique targets
///
/// Without mappings every item source is stored under its own name.
#[derive(Debug, Clone)]
pub struct MemoryProcessor {
    mappings: Vec<Mapping>,
    entities: IndexMap<u64, ValueMap>,
    next_id: u64,
}

impl Default for MemoryProcessor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryProcessor {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self {
            mappings,
            entities: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Seed the store from a JSON lines file written by `write_jsonl`
    ///
    /// A missing file leaves the store empty.
    pub fn load_jsonl(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entity: Entity = serde_json::from_str(&line)?;
            self.next_id = self.next_id.max(entity.id + 1);
            self.entities.insert(entity.id, entity.fields);
        }

        debug!(path = %path.display(), entities = self.entities.len(), "Loaded entities");
        Ok(())
    }

    /// Write every entity as one JSON object per line
    pub fn write_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|_| Error::FileNotWritable {
            path: path.display().to_string(),
        })?;
        let mut writer = BufWriter::new(file);

        for entity in self.entities() {
            serde_json::to_writer(&mut writer, &entity)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(path = %path.display(), entities = self.entities.len(), "Wrote entities");
        Ok(())
    }

    /// Stored entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().map(|(id, fields)| Entity {
            id: *id,
            fields: fields.clone(),
        })
    }

    /// Fields of one entity
    pub fn get(&self, id: u64) -> Option<&ValueMap> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Entity fields for one item
    fn map(&self, item: &Item) -> ValueMap {
        if self.mappings.is_empty() {
            return item.to_array();
        }
        self.mappings
            .iter()
            .map(|mapping| (mapping.target.clone(), item.get(&mapping.source).clone()))
            .collect()
    }

    /// The entity sharing a non-empty unique target value
    fn existing(&self, fields: &ValueMap) -> Option<u64> {
        self.mappings
            .iter()
            .filter(|mapping| mapping.unique)
            .filter_map(|mapping| {
                let value = fields.get(&mapping.target)?;
                (!value_is_empty(value)).then_some((&mapping.target, value))
            })
            .find_map(|(target, value)| {
                self.entities
                    .iter()
                    .find(|(_, entity)| entity.get(target) == Some(value))
                    .map(|(id, _)| *id)
            })
    }

    fn save(&mut self, item: &Item, state: &mut ImportState) {
        if !item.is_valid() {
            let message = format!("The item could not be imported: {}", item.invalid_message());
            state.set_message(message.clone(), Severity::Error, true);
            state.report(ReportCode::Failed, message);
            return;
        }

        let fields = self.map(item);
        match self.existing(&fields) {
            Some(id) => {
                let Some(entity) = self.entities.get_mut(&id) else {
                    return;
                };
                let changed = fields
                    .iter()
                    .any(|(target, value)| entity.get(target) != Some(value));
                if changed {
                    entity.extend(fields);
                    state.report(ReportCode::Updated, format!("Updated entity {id}"));
                } else {
                    state.report(ReportCode::Skipped, format!("Entity {id} is unchanged"));
                }
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.entities.insert(id, fields);
                state.report(ReportCode::Created, format!("Created entity {id}"));
            }
        }
    }
}

impl ItemProcessor for MemoryProcessor {
    fn process(&mut self, items: Vec<Item>, state: &mut ImportState) -> Result<()> {
        for item in &items {
            self.save(item, state);
        }
        Ok(())
    }
}

