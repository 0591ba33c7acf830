//! Import types
//!
//! Reports returned by the import driver.

use crate::state::StateMessage;

/// Outcome of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Items read by the parser
    pub parsed: usize,
    /// Items left after tampering and handed to the processor
    pub kept: usize,
    /// Whether the source has been read to the end
    pub complete: bool,
    /// Messages queued by the parse and process stages during the batch
    pub messages: Vec<StateMessage>,
}

impl BatchReport {
    /// Items dropped by a tamper plugin
    pub fn dropped(&self) -> usize {
        self.parsed - self.kept
    }
}

/// Totals over every batch run by `Importer::import_all`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    /// Batches run in this call
    pub batches: u64,
    pub parsed: usize,
    pub kept: usize,
    pub complete: bool,
}

impl ImportSummary {
    /// Fold a batch into the totals
    pub fn add_batch(&mut self, report: &BatchReport) {
        self.batches += 1;
        self.parsed += report.parsed;
        self.kept += report.kept;
        self.complete = report.complete;
    }
}
