//! Tests for the parsers

use super::csv::parse_csv_line;
use super::*;
use crate::state::BATCH_COMPLETE;
use crate::types::{Delimiter, JsonValue, Severity};
use serde_json::json;
use tempfile::tempdir;
use test_case::test_case;

const EXAMPLE: &str = "Header A,Header B,Header C\n\
\"\"\"1\"\"\",b1,c1\n\
2,b2,c2\n\
3,b3,c3\n\
4,\"new\r\nline 2\",c4\n\
5,b5,c5\n\
6,b6,c6\n\
7,b7,c7\n";

const CONTENT: &str = "guid,title\n1,Lorem ipsum\n2,Ut wisi enim ad minim veniam\n";

fn no_sources() -> IndexMap<String, MappingSource> {
    IndexMap::new()
}

fn csv(config: ParserConfig) -> CsvParser {
    CsvParser::new(config, &no_sources())
}

fn titles(items: &[Item], field: &str) -> Vec<JsonValue> {
    items.iter().map(|item| item.get(field).clone()).collect()
}

// ============================================================================
// Line Splitting Tests
// ============================================================================

#[test_case("a,b,c", ',' => vec!["a", "b", "c"]; "plain")]
#[test_case("a,,c", ',' => vec!["a", "", "c"]; "empty field")]
#[test_case(" a , b ", ',' => vec![" a ", " b "]; "keeps whitespace")]
#[test_case("\"a,b\",c", ',' => vec!["a,b", "c"]; "quoted delimiter")]
#[test_case("\"say \"\"hi\"\"\",x", ',' => vec!["say \"hi\"", "x"]; "doubled quotes")]
#[test_case("1,5\" screen", ',' => vec!["1", "5\" screen"]; "quote inside unquoted field")]
#[test_case("\"ab\"cd,e", ',' => vec!["abcd", "e"]; "text after closing quote")]
#[test_case("a, \"b\"", ',' => vec!["a", " \"b\""]; "quote after leading space")]
#[test_case("a\tb", '\t' => vec!["a", "b"]; "tab")]
#[test_case("a;b|c", ';' => vec!["a", "b|c"]; "semicolon")]
fn test_parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    parse_csv_line(line, delimiter)
}

// ============================================================================
// CSV Parser Tests
// ============================================================================

#[test]
fn test_parse_in_batches() {
    let parser = csv(ParserConfig::default().line_limit(3));
    let result = FetcherResult::from_bytes(EXAMPLE);
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].get("Header A"), &json!("\"1\""));
    assert_eq!(titles(&items, "Header C"), vec![json!("c1"), json!("c2"), json!("c3")]);
    assert!(!state.is_completed());
    assert!(state.progress < 0.99);
    assert_eq!(state.total, EXAMPLE.len() as u64);

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].get("Header B"), &json!("new\r\nline 2"));
    assert_eq!(items[2].get("Header A"), &json!("6"));
    assert!(!state.is_completed());

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("Header A"), &json!("7"));
    assert!(state.is_completed());

    let items = parser.parse(&result, &mut state).unwrap();
    assert!(items.is_empty());
    assert_eq!(state.progress, BATCH_COMPLETE);
}

#[test]
fn test_parse_file_in_batches() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("example.csv");
    std::fs::write(&file, EXAMPLE).unwrap();

    let parser = csv(ParserConfig::default().line_limit(3));
    let result = FetcherResult::from_path(&file);
    let mut state = ImportState::new();

    let first = parser.parse(&result, &mut state).unwrap();
    let pointer = state.pointer;
    let second = parser.parse(&result, &mut state).unwrap();

    assert_eq!(titles(&first, "Header A"), vec![json!("\"1\""), json!("2"), json!("3")]);
    assert_eq!(titles(&second, "Header A"), vec![json!("4"), json!("5"), json!("6")]);
    assert!(state.pointer > pointer);
}

#[test]
fn test_parse_without_headers() {
    let sources: IndexMap<String, MappingSource> = serde_yaml::from_str(
        "column1: { label: Column 1, value: 0 }\ncolumn2: { label: Column 2, value: 1 }\n",
    )
    .unwrap();
    let parser = CsvParser::new(ParserConfig::default().no_headers(true).line_limit(3), &sources);
    let result = FetcherResult::from_bytes(CONTENT);
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(
        titles(&items, "column1"),
        vec![json!("guid"), json!("1"), json!("2")]
    );
    assert_eq!(
        titles(&items, "column2"),
        vec![
            json!("title"),
            json!("Lorem ipsum"),
            json!("Ut wisi enim ad minim veniam")
        ]
    );
}

#[test]
fn test_parse_keys_unmapped_columns_by_index() {
    let parser = csv(ParserConfig::default().no_headers(true));
    let result = FetcherResult::from_bytes("a,b\n");
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items[0].get("0"), &json!("a"));
    assert_eq!(items[0].get("1"), &json!("b"));
}

#[test]
fn test_parse_renames_and_skips_sources() {
    let mut sources = IndexMap::new();
    sources.insert("id".to_string(), MappingSource::new("ID", "guid"));
    sources.insert(
        "title".to_string(),
        MappingSource::new("Title", "title").kind("csv"),
    );
    sources.insert("link".to_string(), MappingSource::new("Link", "").kind("xml"));

    let parser = CsvParser::new(ParserConfig::default(), &sources);
    let mut state = ImportState::new();
    let items = parser
        .parse(
            &FetcherResult::from_bytes("guid,title,link\n1,Lorem ipsum,http://example.com\n"),
            &mut state,
        )
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("id"), &json!("1"));
    assert_eq!(items[0].get("title"), &json!("Lorem ipsum"));
    assert!(!items[0].has("guid"));
    assert!(!items[0].has("link"));
}

#[test]
fn test_parse_with_extra_blank_lines() {
    let source = "guid,title\n\n1,a\n2,b\n\r\n3,c\n4,d\n\n\n5,e\n6,f\n7,g\n\n8,h\n9,i\n\n\n\n";
    let parser = csv(ParserConfig::default());
    let result = FetcherResult::from_bytes(source);
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 9);

    let items = parser.parse(&result, &mut state).unwrap();
    assert!(items.is_empty());
    assert_eq!(state.progress, BATCH_COMPLETE);
}

#[test]
fn test_parse_stray_quote_stays_in_row() {
    let parser = csv(ParserConfig::default());
    let result = FetcherResult::from_bytes("id,name\n1,5\" screen\n2,foo\n3,\"bar\nbaz\"\n");
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(
        titles(&items, "name"),
        vec![json!("5\" screen"), json!("foo"), json!("bar\nbaz")]
    );
    assert!(state.messages().is_empty());
}

#[test]
fn test_parse_invalid_utf8_row() {
    let parser = csv(ParserConfig::default());
    let result = FetcherResult::from_bytes(b"id,name\n1,caf\xe9\n2,ok\n".to_vec());
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(titles(&items, "name"), vec![json!("caf\u{fffd}"), json!("ok")]);

    let messages = state.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Warning);
    assert!(messages[0].message.contains("byte 8"));
}

#[test]
fn test_parse_trailing_blank_lines_after_limit() {
    let parser = csv(ParserConfig::default().line_limit(2));
    let result = FetcherResult::from_bytes("guid\n1\n2\n\n\n");
    let mut state = ImportState::new();

    assert_eq!(parser.parse(&result, &mut state).unwrap().len(), 2);
    assert!(!state.is_completed());

    assert!(parser.parse(&result, &mut state).unwrap().is_empty());
    assert!(state.is_completed());
}

#[test]
fn test_parse_empty_feed() {
    let parser = csv(ParserConfig::default());
    let mut state = ImportState::new();
    let err = parser
        .parse(&FetcherResult::from_bytes(Vec::<u8>::new()), &mut state)
        .unwrap_err();
    assert!(matches!(err, Error::EmptyFeed));

    let dir = tempdir().unwrap();
    let file = dir.path().join("empty.csv");
    std::fs::write(&file, "").unwrap();
    let err = parser
        .parse(&FetcherResult::from_path(&file), &mut state)
        .unwrap_err();
    assert!(matches!(err, Error::EmptyFeed));
}

#[test]
fn test_parse_crlf_and_tab() {
    let parser = csv(ParserConfig::default().delimiter(Delimiter::Tab));
    let result = FetcherResult::from_bytes("guid\ttitle\r\n1\tLorem, ipsum\r\n");
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("title"), &json!("Lorem, ipsum"));
    assert!(state.is_completed());
}

#[test]
fn test_parse_strips_bom_from_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("bom.csv");
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(CONTENT.as_bytes());
    std::fs::write(&file, bytes).unwrap();

    let parser = csv(ParserConfig::default());
    let mut state = ImportState::new();
    let items = parser
        .parse(&FetcherResult::from_path(&file), &mut state)
        .unwrap();

    assert_eq!(items[0].get("guid"), &json!("1"));
    assert_eq!(state.total, CONTENT.len() as u64);
}

// ============================================================================
// Template Tests
// ============================================================================

#[test]
fn test_template_contents() {
    let mut sources = IndexMap::new();
    sources.insert("guid".to_string(), MappingSource::new("GUID", "guid"));
    sources.insert("title".to_string(), MappingSource::new("Title", "title, main"));
    sources.insert("quote".to_string(), MappingSource::new("Quote", "say \"hi\", bye"));
    sources.insert("blank".to_string(), MappingSource::new("Blank", " "));
    sources.insert("again".to_string(), MappingSource::new("Again", "guid"));
    sources.insert("other".to_string(), MappingSource::new("Other", "x").kind("xml"));

    let parser = CsvParser::new(ParserConfig::default(), &sources);
    assert_eq!(
        parser.template_contents(),
        "guid,\"title, main\",\"say \"\"hi\"\", bye\"\n"
    );
}

#[test]
fn test_template_contents_empty() {
    assert_eq!(csv(ParserConfig::default()).template_contents(), "\n");
}

#[test_case(Delimiter::Comma => ("csv", "text/csv"))]
#[test_case(Delimiter::Semicolon => ("csv", "text/csv"))]
#[test_case(Delimiter::Tab => ("tsv", "text/tab-separated-values"))]
fn test_template_file_details(delimiter: Delimiter) -> (&'static str, &'static str) {
    csv(ParserConfig::default().delimiter(delimiter)).template_file_details()
}

// ============================================================================
// JSON Lines Parser Tests
// ============================================================================

#[test]
fn test_json_lines_in_batches() {
    let source = "{\"guid\": 1, \"title\": \"Lorem ipsum\"}\n\n{\"guid\": 2, \"tags\": [\"a\", \"b\"]}\n{\"guid\": 3}\n";
    let mut sources = IndexMap::new();
    sources.insert("id".to_string(), MappingSource::new("ID", "guid").kind("jsonl"));
    let parser = JsonLinesParser::new(ParserConfig::default().line_limit(2), &sources);
    let result = FetcherResult::from_bytes(source);
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(titles(&items, "id"), vec![json!(1), json!(2)]);
    assert_eq!(items[1].get("tags"), &json!(["a", "b"]));
    assert!(!state.is_completed());

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(titles(&items, "id"), vec![json!(3)]);
    assert!(state.is_completed());
}

#[test]
fn test_json_lines_skips_malformed_lines() {
    let source = "{\"a\": 1}\n{oops\n[1, 2]\n{\"a\": 3}\n";
    let parser = JsonLinesParser::new(ParserConfig::default(), &no_sources());
    let mut state = ImportState::new();

    let items = parser
        .parse(&FetcherResult::from_bytes(source), &mut state)
        .unwrap();
    assert_eq!(titles(&items, "a"), vec![json!(1), json!(3)]);
    assert_eq!(state.failed, 2);
    assert_eq!(state.pointer, source.len() as u64);

    let messages = state.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.severity == Severity::Warning));
    assert!(messages[0].message.contains("byte 9"));
    assert!(messages[1].message.contains("expected a JSON object"));
}

#[test]
fn test_json_lines_malformed_lines_count_towards_limit() {
    let source = "{bad\n{worse\n{\"a\": 3}\n";
    let parser = JsonLinesParser::new(ParserConfig::default().line_limit(2), &no_sources());
    let result = FetcherResult::from_bytes(source);
    let mut state = ImportState::new();

    let items = parser.parse(&result, &mut state).unwrap();
    assert!(items.is_empty());
    assert_eq!(state.failed, 2);
    assert!(!state.is_completed());

    let items = parser.parse(&result, &mut state).unwrap();
    assert_eq!(titles(&items, "a"), vec![json!(3)]);
    assert!(state.is_completed());
}

#[test]
fn test_create_parser() {
    let config = ParserConfig {
        kind: ParserType::Jsonl,
        ..ParserConfig::default()
    };
    assert_eq!(create_parser(&config, &no_sources()).parser_type(), ParserType::Jsonl);
    assert_eq!(
        create_parser(&ParserConfig::default(), &no_sources()).parser_type(),
        ParserType::Csv
    );
}

#[test]
fn test_parser_config_yaml() {
    let config: ParserConfig =
        serde_yaml::from_str("type: csv\ndelimiter: TAB\nno_headers: true\n").unwrap();
    assert_eq!(config.delimiter, Delimiter::Tab);
    assert!(config.no_headers);
    assert_eq!(config.line_limit, DEFAULT_LINE_LIMIT);
}
