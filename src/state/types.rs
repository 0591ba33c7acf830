//! State types for tracking import progress
//!
//! These types are plain data. They are serialized to JSON between batches
//! and never hold a logger or messenger; collaborators are passed in by the
//! caller when messages need to go somewhere.

use crate::types::{ReportCode, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Progress value meaning the stage is done
pub const BATCH_COMPLETE: f64 = 1.0;

/// Highest progress reported while work remains
const BATCH_ALMOST_COMPLETE: f64 = 0.99;

// ============================================================================
// Messages
// ============================================================================

/// A user-facing message collected during a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    /// Whether the same message may be shown more than once
    #[serde(default)]
    pub repeat: bool,
}

/// Receives messages for display
pub trait Messenger {
    fn add_message(&mut self, message: &str, severity: Severity, repeat: bool);
}

/// Messenger that keeps messages in memory
///
/// Non-repeatable messages are only kept once.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<StateMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[StateMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Messenger for MessageLog {
    fn add_message(&mut self, message: &str, severity: Severity, repeat: bool) {
        let seen = self
            .messages
            .iter()
            .any(|m| m.message == message && m.severity == severity);
        if seen && !repeat {
            return;
        }
        self.messages.push(StateMessage {
            message: message.to_string(),
            severity,
            repeat,
        });
    }
}

// ============================================================================
// Import State
// ============================================================================

/// Progress, counters and messages of one stage of an import
///
/// A fresh state reports itself as complete until a parser records a total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportState {
    /// Resumption cursor (byte offset for file based parsers)
    pub pointer: u64,
    /// Total units of work, e.g. the size of the source in bytes
    pub total: u64,
    /// 0.0 to 1.0, where 1.0 means complete
    pub progress: f64,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub failed: u64,
    messages: Vec<StateMessage>,
}

impl Default for ImportState {
    fn default() -> Self {
        Self {
            pointer: 0,
            total: 0,
            progress: BATCH_COMPLETE,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
            failed: 0,
            messages: Vec::new(),
        }
    }
}

impl ImportState {
    /// Create a new state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record progress as `done` units out of `total`
    ///
    /// Reaching or passing the total (including a total of zero) completes
    /// the state. Anything short of it is capped below 1.0.
    pub fn progress(&mut self, total: u64, done: u64) {
        if done >= total {
            self.set_completed();
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = done as f64 / total as f64;
            self.progress = ratio.min(BATCH_ALMOST_COMPLETE);
        }
    }

    /// Mark the state as complete
    pub fn set_completed(&mut self) {
        self.progress = BATCH_COMPLETE;
    }

    /// Whether the stage is done
    pub fn is_completed(&self) -> bool {
        self.progress >= BATCH_COMPLETE
    }

    /// Count one processed item
    pub fn report(&mut self, code: ReportCode, message: impl AsRef<str>) {
        *self.counter_mut(code) += 1;
        let message = message.as_ref();
        if !message.is_empty() {
            debug!(%code, "{message}");
        }
    }

    /// Current value of a counter
    pub fn count(&self, code: ReportCode) -> u64 {
        match code {
            ReportCode::Created => self.created,
            ReportCode::Updated => self.updated,
            ReportCode::Deleted => self.deleted,
            ReportCode::Skipped => self.skipped,
            ReportCode::Failed => self.failed,
        }
    }

    fn counter_mut(&mut self, code: ReportCode) -> &mut u64 {
        match code {
            ReportCode::Created => &mut self.created,
            ReportCode::Updated => &mut self.updated,
            ReportCode::Deleted => &mut self.deleted,
            ReportCode::Skipped => &mut self.skipped,
            ReportCode::Failed => &mut self.failed,
        }
    }

    /// Queue a message for the user
    pub fn set_message(&mut self, message: impl Into<String>, severity: Severity, repeat: bool) {
        self.messages.push(StateMessage {
            message: message.into(),
            severity,
            repeat,
        });
    }

    pub fn messages(&self) -> &[StateMessage] {
        &self.messages
    }

    /// Remove and return the queued messages
    pub fn take_messages(&mut self) -> Vec<StateMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Hand every queued message to a messenger
    pub fn display_messages(&self, messenger: &mut dyn Messenger) {
        for m in &self.messages {
            messenger.add_message(&m.message, m.severity, m.repeat);
        }
    }

    /// Emit every queued message through tracing
    pub fn log_messages(&self, feed: &str) {
        for m in &self.messages {
            match m.severity {
                Severity::Status => info!(feed, "{}", m.message),
                Severity::Warning => warn!(feed, "{}", m.message),
                Severity::Error => error!(feed, "{}", m.message),
            }
        }
    }

    /// Add the counters of another state to this one
    pub fn merge_counters(&mut self, other: &ImportState) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

// ============================================================================
// Feed State
// ============================================================================

/// Stages of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Parse,
    Process,
    Clean,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Fetch, Stage::Parse, Stage::Process, Stage::Clean];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Process => "process",
            Stage::Clean => "clean",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete state of a feed import, persisted between batches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedState {
    /// Feed type name
    pub feed: String,
    /// Location the source was fetched from
    pub source: Option<String>,
    /// Number of batches run so far
    pub batches: u64,
    pub fetch: ImportState,
    pub parse: ImportState,
    pub process: ImportState,
    pub clean: ImportState,
}

impl FeedState {
    /// Create a new state for a feed
    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            ..Self::default()
        }
    }

    /// Set the source location
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// State of one stage
    pub fn stage(&self, stage: Stage) -> &ImportState {
        match stage {
            Stage::Fetch => &self.fetch,
            Stage::Parse => &self.parse,
            Stage::Process => &self.process,
            Stage::Clean => &self.clean,
        }
    }

    /// Mutable state of one stage
    pub fn stage_mut(&mut self, stage: Stage) -> &mut ImportState {
        match stage {
            Stage::Fetch => &mut self.fetch,
            Stage::Parse => &mut self.parse,
            Stage::Process => &mut self.process,
            Stage::Clean => &mut self.clean,
        }
    }

    /// Whether the source has been fully parsed
    pub fn is_completed(&self) -> bool {
        self.parse.is_completed()
    }

    /// Reset every stage, keeping the feed name and source
    pub fn reset(&mut self) {
        self.batches = 0;
        for stage in Stage::ALL {
            *self.stage_mut(stage) = ImportState::new();
        }
    }
}
