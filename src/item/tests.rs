//! Tests for the item module

use super::*;
use crate::types::ValueMap;
use pretty_assertions::assert_eq;
use serde_json::json;

// ============================================================================
// Get / Set Tests
// ============================================================================

#[test]
fn test_get_unknown_field_is_null() {
    let item = Item::new();
    assert_eq!(item.get("missing"), &json!(null));
    assert!(!item.has("missing"));
}

#[test]
fn test_set_and_get_overflow() {
    let mut item = Item::new();
    item.set("title", json!("Lorem ipsum"));
    assert_eq!(item.get("title"), &json!("Lorem ipsum"));
    assert!(item.has("title"));
}

#[test]
fn test_declared_property_takes_the_write() {
    let mut item = Item::with_declared(["guid", "title"]);
    item.set("title", json!("Hello"));

    assert_eq!(item.get("title"), &json!("Hello"));
    assert_eq!(
        item.declared_fields().collect::<Vec<_>>(),
        vec!["guid", "title"]
    );
    // The overflow bag stays untouched
    assert_eq!(item.to_array().len(), 2);
}

#[test]
fn test_reserved_data_field_uses_overflow() {
    let mut item = Item::with_declared(["data", "title"]);
    item.set("data", json!({"raw": true}));

    assert_eq!(item.get("data"), &json!({"raw": true}));
    // The declared `data` property is never reached
    let array = item.to_array();
    assert_eq!(array.get("data"), Some(&json!({"raw": true})));
}

// ============================================================================
// Array Conversion Tests
// ============================================================================

#[test]
fn test_to_array_overflow_wins() {
    let mut item = Item::with_declared(["title"]);
    item.set("title", json!("declared"));
    item.set("body", json!("text"));

    let array = item.to_array();
    assert_eq!(
        array.keys().cloned().collect::<Vec<_>>(),
        vec!["title".to_string(), "body".to_string()]
    );
}

#[test]
fn test_from_array_applies_set_in_order() {
    let mut map = ValueMap::new();
    map.insert("a".to_string(), json!(1));
    map.insert("b".to_string(), json!([1, 2]));
    map.insert("a".to_string(), json!(3));

    let item = Item::from_map(map);
    assert_eq!(item.get("a"), &json!(3));
    assert_eq!(item.get("b"), &json!([1, 2]));
}

#[test]
fn test_round_trip_reconstructs_fields() {
    let mut item = Item::with_declared(["guid", "title"]);
    item.set("guid", json!("1"));
    item.set("title", json!("Lorem ipsum"));
    item.set("tags", json!(["a", "b"]));
    item.set("data", json!("overflow"));
    item.mark_invalid("ignored by round trip");

    let mut rebuilt = Item::with_declared(["guid", "title"]);
    rebuilt.from_array(item.to_array());

    for field in ["guid", "title", "tags", "data"] {
        assert_eq!(rebuilt.get(field), item.get(field), "field {field}");
    }
    assert_eq!(rebuilt.to_array(), item.to_array());
}

// ============================================================================
// Validity Tests
// ============================================================================

#[test]
fn test_validity_defaults_and_toggles() {
    let mut item = Item::new();
    assert!(item.is_valid());
    assert_eq!(item.invalid_message(), "");

    item.mark_invalid("Bad row");
    assert!(!item.is_valid());
    assert_eq!(item.invalid_message(), "Bad row");

    item.mark_valid();
    assert!(item.is_valid());
    assert_eq!(item.invalid_message(), "");
}

#[test]
fn test_item_serde_defaults_valid() {
    let item: Item = serde_json::from_str(r#"{"data": {"title": "x"}}"#).unwrap();
    assert!(item.is_valid());
    assert_eq!(item.get("title"), &json!("x"));
}

// ============================================================================
// TamperableItem Tests
// ============================================================================

#[test]
fn test_tamperable_item_view() {
    let mut item = Item::new();
    item.set("title", json!("Foo"));

    let view: &mut dyn TamperableItem = &mut item;
    assert_eq!(view.source_property("title"), json!("Foo"));
    view.set_source_property("title", json!("Bar"));
    assert_eq!(view.source().get("title"), Some(&json!("Bar")));
    assert_eq!(item.get("title"), &json!("Bar"));
}
