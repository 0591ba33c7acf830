//! Tests for import state types

use super::*;
use crate::types::{ReportCode, Severity};
use test_case::test_case;

// ============================================================================
// Progress Tests
// ============================================================================

#[test]
fn test_fresh_state_is_complete() {
    let state = ImportState::new();
    assert_eq!(state.progress, BATCH_COMPLETE);
    assert!(state.is_completed());
    assert_eq!(state.pointer, 0);
}

#[test_case(100, 50 => 0.5 ; "halfway")]
#[test_case(100, 100 => 1.0 ; "done")]
#[test_case(100, 150 => 1.0 ; "past the total")]
#[test_case(0, 0 => 1.0 ; "zero total")]
#[test_case(1000, 999 => 0.99 ; "capped below complete")]
#[test_case(100_000, 99_999 => 0.99 ; "rounding stays below complete")]
fn test_progress(total: u64, done: u64) -> f64 {
    let mut state = ImportState::new();
    state.progress(total, done);
    state.progress
}

#[test]
fn test_set_completed() {
    let mut state = ImportState::new();
    state.progress(10, 1);
    assert!(!state.is_completed());
    state.set_completed();
    assert!(state.is_completed());
}

// ============================================================================
// Counter Tests
// ============================================================================

#[test]
fn test_report_increments_counters() {
    let mut state = ImportState::new();
    state.report(ReportCode::Created, "");
    state.report(ReportCode::Created, "Created item 2");
    state.report(ReportCode::Skipped, "Skipped item 3");
    state.report(ReportCode::Failed, "");

    assert_eq!(state.count(ReportCode::Created), 2);
    assert_eq!(state.count(ReportCode::Skipped), 1);
    assert_eq!(state.count(ReportCode::Failed), 1);
    assert_eq!(state.count(ReportCode::Updated), 0);
    assert_eq!(state.count(ReportCode::Deleted), 0);
}

#[test]
fn test_merge_counters() {
    let mut total = ImportState::new();
    total.created = 1;
    let mut batch = ImportState::new();
    batch.created = 2;
    batch.failed = 1;

    total.merge_counters(&batch);
    assert_eq!(total.created, 3);
    assert_eq!(total.failed, 1);
}

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_messages_queue_in_order() {
    let mut state = ImportState::new();
    state.set_message("first", Severity::Status, false);
    state.set_message("second", Severity::Warning, true);

    let texts: Vec<&str> = state.messages().iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);

    let taken = state.take_messages();
    assert_eq!(taken.len(), 2);
    assert!(state.messages().is_empty());
}

#[test]
fn test_display_messages_respects_repeat() {
    let mut state = ImportState::new();
    state.set_message("once", Severity::Warning, false);
    state.set_message("once", Severity::Warning, false);
    state.set_message("again", Severity::Error, true);
    state.set_message("again", Severity::Error, true);

    let mut log = MessageLog::new();
    state.display_messages(&mut log);

    let shown: Vec<(&str, Severity)> = log
        .messages()
        .iter()
        .map(|m| (m.message.as_str(), m.severity))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("once", Severity::Warning),
            ("again", Severity::Error),
            ("again", Severity::Error),
        ]
    );
}

#[test]
fn test_log_messages_keeps_queue() {
    let mut state = ImportState::new();
    state.set_message("done", Severity::Status, false);
    state.log_messages("articles");
    assert_eq!(state.messages().len(), 1);
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_state_serialization() {
    let mut state = ImportState::new();
    state.pointer = 64;
    state.progress(128, 64);
    state.report(ReportCode::Updated, "");
    state.set_message("Tampering failed", Severity::Warning, false);

    let json = serde_json::to_string(&state).unwrap();
    let restored: ImportState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
}

#[test]
fn test_missing_fields_use_defaults() {
    let state: ImportState = serde_json::from_str(r#"{"pointer": 10}"#).unwrap();
    assert_eq!(state.pointer, 10);
    assert_eq!(state.progress, BATCH_COMPLETE);
    assert!(state.messages().is_empty());

    let message: StateMessage = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
    assert_eq!(message.severity, Severity::Status);
    assert!(!message.repeat);
}

#[test]
fn test_feed_state_stages() {
    let mut feed = FeedState::new("articles");
    feed.stage_mut(Stage::Parse).progress(10, 5);
    feed.stage_mut(Stage::Process).created = 4;

    assert!(!feed.is_completed());
    assert_eq!(feed.stage(Stage::Process).created, 4);

    let json = serde_json::to_value(&feed).unwrap();
    assert_eq!(json["parse"]["progress"], serde_json::json!(0.5));

    feed.reset();
    assert!(feed.is_completed());
    assert_eq!(feed.process.created, 0);
    assert_eq!(feed.feed, "articles");
}

#[test]
fn test_stage_names() {
    let names: Vec<String> = Stage::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["fetch", "parse", "process", "clean"]);
    assert_eq!(
        serde_json::to_string(&Stage::Process).unwrap(),
        "\"process\""
    );
}
