//! State management module
//!
//! Tracks progress, counters and messages of an import and persists them
//! between batches so a large source can be imported over several runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `ImportState` - Pointer, total, progress, counters and messages of one stage
//! - `FeedState` - One `ImportState` per `Stage` of a feed import
//! - `Messenger` - Sink for user-facing messages, with `MessageLog` as an in-memory one
//! - `StateManager` - File-based state persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{
    FeedState, ImportState, MessageLog, Messenger, Stage, StateMessage, BATCH_COMPLETE,
};

#[cfg(test)]
mod manager_tests;
#[cfg(test)]
mod tests;
