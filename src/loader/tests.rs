//! Tests for YAML loader module

use super::*;
use crate::error::Error;
use crate::parser::ParserType;
use crate::tamper::TamperRegistry;
use crate::types::{BackoffType, Delimiter};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// Basic Loading Tests
// ============================================================================

#[test]
fn test_load_minimal_feed_type() {
    let def = load_feed_type_from_str("name: articles\n").unwrap();
    assert_eq!(def.name, "articles");
    assert_eq!(def.display_label(), "articles");
    assert_eq!(def.parser.kind, ParserType::Csv);
    assert_eq!(def.parser.delimiter, Delimiter::Comma);
    assert_eq!(def.parser.line_limit, 100);
    assert!(!def.parser.no_headers);
    assert!(def.sources.is_empty());
    assert!(def.tampers.is_empty());
    assert!(def.mappings.is_empty());
}

#[test]
fn test_load_full_feed_type() {
    let yaml = r#"
name: articles
label: Articles
description: Nightly article export
parser:
  type: csv
  delimiter: TAB
  no_headers: false
  line_limit: 50
http:
  max_retries: 1
  backoff: constant
sources:
  guid: { label: GUID, value: guid }
  title: { label: Title, value: title, type: csv }
  feed_label: { label: Feed label, provider: feed_name }
tampers:
  - source: title
    plugin: trim
    label: Trim title
    config: { side: trim }
  - source: tags
    plugin: explode
    weight: 2
    config:
      separator: "|"
mappings:
  - target: guid
    source: guid
    unique: true
  - target: name
    source: title
"#;

    let def = load_feed_type_from_str(yaml).unwrap();
    assert_eq!(def.display_label(), "Articles");
    assert_eq!(def.parser.delimiter, Delimiter::Tab);
    assert_eq!(def.parser.line_limit, 50);
    assert_eq!(def.http.max_retries, 1);
    assert_eq!(def.http.backoff, BackoffType::Constant);

    assert_eq!(
        def.sources.keys().collect::<Vec<_>>(),
        vec!["guid", "title", "feed_label"]
    );
    assert_eq!(def.sources["title"].kind.as_deref(), Some("csv"));
    assert_eq!(
        def.provided_sources().collect::<Vec<_>>(),
        vec![("feed_label", "feed_name")]
    );

    assert_eq!(def.tampers.len(), 2);
    assert_eq!(def.tampers[0].label.as_deref(), Some("Trim title"));
    assert_eq!(def.tampers[0].weight, 0);
    assert_eq!(def.tampers[1].config, json!({"separator": "|"}));

    assert_eq!(def.unique_targets().collect::<Vec<_>>(), vec!["guid"]);
    assert!(!def.mappings[1].unique);
}

#[test]
fn test_load_numeric_source_values() {
    let yaml = r#"
name: columns
parser:
  no_headers: true
sources:
  first: { label: First, value: 0 }
  second: { label: Second, value: 1 }
"#;
    let def = load_feed_type_from_str(yaml).unwrap();
    assert_eq!(def.sources["first"].value, "0");
    assert_eq!(def.sources["second"].value, "1");
}

#[test]
fn test_load_feed_type_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "name: from-file\nparser:\n  type: jsonl").unwrap();

    let def = load_feed_type(file.path()).unwrap();
    assert_eq!(def.name, "from-file");
    assert_eq!(def.parser.kind, ParserType::Jsonl);
}

#[test]
fn test_load_missing_file() {
    let err = load_feed_type("/nonexistent/feed.yaml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_validation_empty_name() {
    let err = load_feed_type_from_str("name: \"\"\n").unwrap_err();
    assert!(err.to_string().contains("name cannot be empty"));
}

#[test]
fn test_validation_zero_line_limit() {
    let err = load_feed_type_from_str("name: a\nparser:\n  line_limit: 0\n").unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[test]
fn test_validation_invalid_delimiter() {
    let err = load_feed_type_from_str("name: a\nparser:\n  delimiter: \"#\"\n").unwrap_err();
    assert!(err.to_string().contains("Failed to parse feed type YAML"));
}

#[test]
fn test_validation_empty_tamper_source() {
    let yaml = "name: a\ntampers:\n  - source: \"\"\n    plugin: trim\n";
    let err = load_feed_type_from_str(yaml).unwrap_err();
    assert!(err.to_string().contains("empty source"));
}

#[test]
fn test_validation_reserved_target() {
    let yaml = "name: a\nmappings:\n  - target: id\n    source: guid\n";
    let err = load_feed_type_from_str(yaml).unwrap_err();
    assert!(err.to_string().contains("reserved"));
}

#[test]
fn test_validation_duplicate_target() {
    let yaml = "name: a\nmappings:\n  - target: t\n    source: a\n  - target: t\n    source: b\n";
    let err = load_feed_type_from_str(yaml).unwrap_err();
    assert!(err.to_string().contains("Duplicate mapping target"));
}

#[test]
fn test_validate_tampers() {
    let registry = TamperRegistry::with_builtins();

    let def = load_feed_type_from_str(
        "name: a\ntampers:\n  - source: title\n    plugin: trim\n  - source: title\n    plugin: implode\n",
    )
    .unwrap();
    let chains = validate_tampers(&def, &registry).unwrap();
    assert_eq!(chains.len(), 1);

    let def =
        load_feed_type_from_str("name: a\ntampers:\n  - source: title\n    plugin: nope\n").unwrap();
    assert!(matches!(
        validate_tampers(&def, &registry),
        Err(Error::UnknownPlugin { .. })
    ));

    let def = load_feed_type_from_str(
        "name: a\ntampers:\n  - source: title\n    plugin: copy\n    config: { source: \"\" }\n",
    )
    .unwrap();
    assert!(validate_tampers(&def, &registry).is_err());
}
