//! Tests for StateManager

use super::*;
use tempfile::tempdir;

fn parsed_halfway() -> FeedState {
    let mut state = FeedState::new("articles").with_source("data.csv");
    state.parse.pointer = 120;
    state.parse.progress(240, 120);
    state.process.created = 3;
    state.batches = 1;
    state
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert!(manager.auto_save());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-state.json");
}

#[test]
fn test_state_manager_without_auto_save() {
    let manager = StateManager::without_auto_save("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert!(!manager.auto_save());
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_from_json() {
    let manager =
        StateManager::from_json(r#"{"feed": "articles", "parse": {"pointer": 42, "total": 100, "progress": 0.42}}"#)
            .unwrap();
    let state = manager.state().await;
    assert_eq!(state.feed, "articles");
    assert_eq!(state.parse.pointer, 42);
    assert!(!state.parse.is_completed());
    assert!(state.process.is_completed());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::without_auto_save(&path);
    *manager.state_mut().await = parsed_halfway();
    manager.save().await.unwrap();
    assert!(!path.with_extension("tmp").exists());

    let manager2 = StateManager::new(&path);
    manager2.load().await.unwrap();

    assert_eq!(manager2.snapshot().await, parsed_halfway());
}

#[tokio::test]
async fn test_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::from_file(&path).unwrap();
    assert_eq!(manager.snapshot().await, FeedState::default());

    manager.update(parsed_halfway()).await.unwrap();

    let reopened = StateManager::from_file(&path).unwrap();
    assert_eq!(reopened.snapshot().await.parse.pointer, 120);
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.json");

    let manager = StateManager::new(&path);
    manager.load().await.unwrap();

    assert_eq!(manager.snapshot().await, FeedState::default());
}

#[tokio::test]
async fn test_auto_save_on_update() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto_state.json");

    let manager = StateManager::new(&path);
    manager.update(parsed_halfway()).await.unwrap();

    let manager2 = StateManager::new(&path);
    manager2.load().await.unwrap();
    assert_eq!(manager2.state().await.process.created, 3);
}

#[tokio::test]
async fn test_save_in_memory_noop() {
    let manager = StateManager::in_memory();
    manager.update(parsed_halfway()).await.unwrap();
    manager.save().await.unwrap();
}

#[tokio::test]
async fn test_to_json_round_trips_through_from_json() {
    let manager = StateManager::in_memory();
    manager.update(parsed_halfway()).await.unwrap();

    let json = manager.to_json().await.unwrap();
    let restored = StateManager::from_json(&json).unwrap();
    assert_eq!(restored.snapshot().await, parsed_halfway());
}

// ============================================================================
// Clear Tests
// ============================================================================

#[tokio::test]
async fn test_clear_resets_progress() {
    let manager = StateManager::in_memory();
    manager.update(parsed_halfway()).await.unwrap();

    manager.clear().await.unwrap();

    let state = manager.snapshot().await;
    assert_eq!(state.feed, "articles");
    assert_eq!(state.source.as_deref(), Some("data.csv"));
    assert_eq!(state.parse.pointer, 0);
    assert_eq!(state.process.created, 0);
    assert_eq!(state.batches, 0);
}

// ============================================================================
// Clone Tests
// ============================================================================

#[tokio::test]
async fn test_clone_shares_state() {
    let manager = StateManager::in_memory();
    let cloned = manager.clone();

    manager.state_mut().await.parse.pointer = 7;

    assert_eq!(cloned.state().await.parse.pointer, 7);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_load_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("invalid.json");

    tokio::fs::write(&path, "{ invalid json }").await.unwrap();

    let manager = StateManager::new(&path);
    let result = manager.load().await;

    assert!(result.is_err());
    assert!(StateManager::from_file(&path).is_err());
}
