//! Tests for the built-in tamper plugins

use super::*;
use crate::item::{Item, TamperableItem};
use crate::tamper::registry::TamperRegistry;
use crate::types::ValueMap;
use serde_json::json;
use std::cell::Cell;
use test_case::test_case;

fn run<T: FromConfig>(config: JsonValue, data: JsonValue) -> Result<Tampered> {
    T::from_config(&config)?.tamper(data, None)
}

fn run_value<T: FromConfig>(config: JsonValue, data: JsonValue) -> JsonValue {
    match run::<T>(config, data).unwrap() {
        Tampered::Value(v) => v,
        other => panic!("expected a value, got {other:?}"),
    }
}

fn run_with_item<T: FromConfig>(config: JsonValue, data: JsonValue, item: &mut Item) -> JsonValue {
    let plugin = T::from_config(&config).unwrap();
    match plugin.tamper(data, Some(item)).unwrap() {
        Tampered::Value(v) => v,
        other => panic!("expected a value, got {other:?}"),
    }
}

// ============================================================================
// List Plugins
// ============================================================================

#[test_case(json!({}), "a,b,c" => json!(["a", "b", "c"]) ; "default separator")]
#[test_case(json!({"separator": "%s"}), "a b" => json!(["a", "b"]) ; "space separator")]
#[test_case(json!({"separator": "%t"}), "a\tb" => json!(["a", "b"]) ; "tab separator")]
#[test_case(json!({"separator": "|"}), "a,b" => json!(["a,b"]) ; "no separator found")]
#[test_case(json!({"limit": 2}), "a,b,c" => json!(["a", "b,c"]) ; "positive limit")]
#[test_case(json!({"limit": -1}), "a,b,c" => json!(["a", "b"]) ; "negative limit")]
#[test_case(json!({"limit": 0}), "a,b,c" => json!(["a,b,c"]) ; "zero limit")]
fn test_explode(config: JsonValue, input: &str) -> JsonValue {
    run_value::<Explode>(config, json!(input))
}

#[test]
fn test_explode_rejects_list() {
    let err = run::<Explode>(json!({}), json!(["a", "b"])).unwrap_err();
    assert_eq!(err.to_string(), "Input should be a string.");
}

#[test]
fn test_explode_empty_separator_is_a_config_error() {
    assert!(Explode::from_config(&json!({"separator": ""})).is_err());
}

#[test_case(json!(["a", "b", "c"]) => json!("a|b|c") ; "list")]
#[test_case(json!("a") => json!("a") ; "scalar is a list of one")]
#[test_case(json!([1, true, null]) => json!("1|1|") ; "mixed scalars")]
fn test_implode(input: JsonValue) -> JsonValue {
    run_value::<Implode>(json!({"glue": "|"}), input)
}

#[test_case("sum", json!([1, 2, 3, 4]) => json!(10))]
#[test_case("average", json!([1, 2, 3, 4]) => json!(2.5))]
#[test_case("median", json!([4, 1, 3, 2]) => json!(2.5))]
#[test_case("median", json!([5, 1, 3]) => json!(3))]
#[test_case("max", json!(["4", 1, 3]) => json!(4))]
#[test_case("min", json!([4, 1, 3]) => json!(1))]
#[test_case("range", json!([4, 1, 3]) => json!(3))]
#[test_case("mode", json!([1, 2, 2, 3]) => json!(2))]
#[test_case("count", json!([1, [2, 3], 4]) => json!(3))]
fn test_aggregate(function: &str, input: JsonValue) -> JsonValue {
    run_value::<Aggregate>(json!({ "function": function }), input)
}

#[test]
fn test_aggregate_recursive_count() {
    let out = run_value::<Aggregate>(
        json!({"function": "count", "count": "recursive"}),
        json!([1, [2, 3], 4]),
    );
    assert_eq!(out, json!(5));
}

#[test]
fn test_aggregate_requires_list() {
    let err = run::<Aggregate>(json!({"function": "sum"}), json!("1,2")).unwrap_err();
    assert_eq!(err.to_string(), "Input should be an array.");
}

#[test]
fn test_unique() {
    let out = run_value::<Unique>(json!({}), json!(["a", "b", "a", "c", "b"]));
    assert_eq!(out, json!(["a", "b", "c"]));
    assert_eq!(run_value::<Unique>(json!({}), json!("a")), json!("a"));
}

// ============================================================================
// Text Plugins
// ============================================================================

#[test_case(json!({}), json!("  foo  ") => json!("foo") ; "both sides")]
#[test_case(json!({"side": "ltrim"}), json!("  foo  ") => json!("foo  ") ; "left")]
#[test_case(json!({"side": "rtrim"}), json!("  foo  ") => json!("  foo") ; "right")]
#[test_case(json!({"character": "$"}), json!("$$foo$$") => json!("foo") ; "character mask")]
#[test_case(json!({}), json!(null) => json!(null) ; "null passes")]
#[test_case(json!({}), json!(12) => json!("12") ; "number")]
fn test_trim(config: JsonValue, input: JsonValue) -> JsonValue {
    run_value::<Trim>(config, input)
}

#[test_case("strtoupper", "hello World" => json!("HELLO WORLD"))]
#[test_case("strtolower", "hello World" => json!("hello world"))]
#[test_case("ucfirst", "hello world" => json!("Hello world"))]
#[test_case("ucwords", "hello big  world" => json!("Hello Big  World"))]
fn test_convert_case(operation: &str, input: &str) -> JsonValue {
    run_value::<ConvertCase>(json!({ "operation": operation }), json!(input))
}

#[test_case(json!({"find": "hello", "replace": "bye"}), "Hello hello" => json!("bye bye") ; "case insensitive")]
#[test_case(json!({"find": "hello", "replace": "bye", "case_sensitive": true}), "Hello hello" => json!("Hello bye") ; "case sensitive")]
#[test_case(json!({"find": "cat", "replace": "dog", "word_boundaries": true}), "cat catalog" => json!("dog catalog") ; "word boundaries")]
#[test_case(json!({"find": "cat", "replace": "dog", "whole": true}), "cat catalog" => json!("cat catalog") ; "whole value no match")]
#[test_case(json!({"find": "$1", "replace": "$2"}), "costs $1" => json!("costs $2") ; "literal dollars")]
fn test_find_replace(config: JsonValue, input: &str) -> JsonValue {
    run_value::<FindReplace>(config, json!(input))
}

#[test]
fn test_html_entities() {
    let encoded = run_value::<HtmlEntityEncode>(json!({}), json!("<b>\"Tom\" & 'Jerry'</b>"));
    assert_eq!(
        encoded,
        json!("&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;")
    );

    let decoded = run_value::<HtmlEntityDecode>(json!({}), encoded);
    assert_eq!(decoded, json!("<b>\"Tom\" & 'Jerry'</b>"));

    let decoded = run_value::<HtmlEntityDecode>(json!({}), json!("&#65;&#x42;&unknown;"));
    assert_eq!(decoded, json!("AB&unknown;"));

    assert!(run::<HtmlEntityEncode>(json!({}), json!(5)).is_err());
}

#[test_case(json!("hello") => json!(5) ; "ascii")]
#[test_case(json!("héllo") => json!(5) ; "multibyte")]
#[test_case(json!(null) => json!(null) ; "null passes")]
fn test_str_len(input: JsonValue) -> JsonValue {
    run_value::<StrLen>(json!({}), input)
}

#[test]
fn test_str_len_rejects_non_string() {
    let err = run::<StrLen>(json!({}), json!(5)).unwrap_err();
    assert_eq!(err.to_string(), "Input should be a string.");
}

#[test]
fn test_word_count() {
    assert_eq!(
        run_value::<WordCount>(json!({}), json!("one two three")),
        json!(3)
    );
    assert_eq!(
        run_value::<WordCount>(json!({"limit": 2}), json!("one two three")),
        json!(2)
    );
}

#[test_case("base64_encode", json!("hello") => json!("aGVsbG8=") ; "base64 encode")]
#[test_case("base64_decode", json!("aGVsbG8=") => json!("hello") ; "base64 decode")]
#[test_case("base64_encode", json!(["a", "b"]) => json!(["YQ==", "Yg=="]) ; "base64 maps over lists")]
#[test_case("json_encode", json!(["a", 1]) => json!("[\"a\",1]") ; "json encode whole list")]
#[test_case("json_decode", json!("{\"a\":[1,2]}") => json!({"a": [1, 2]}) ; "json decode")]
#[test_case("yaml_decode", json!("a: 1\nb: [x, y]\n") => json!({"a": 1, "b": ["x", "y"]}) ; "yaml decode")]
fn test_encode(mode: &str, input: JsonValue) -> JsonValue {
    run_value::<Encode>(json!({ "mode": mode }), input)
}

#[test]
fn test_encode_invalid_mode() {
    let err = Encode::from_config(&json!({"mode": "rot13"})).unwrap_err();
    assert!(err
        .to_string()
        .contains("The selected encode mode \"rot13\" is invalid."));
}

#[test]
fn test_absolute_url() {
    let mut item = Item::new();
    item.set("link", json!("http://example.com/blog/"));

    let html = r##"<a href="/about">About</a> <img src='pic.png'> <a href="https://other.org/x">X</a> <a href="#top">Top</a>"##;
    let out = run_with_item::<AbsoluteUrl>(json!({"source": "link"}), json!(html), &mut item);

    assert_eq!(
        out,
        json!(
            r##"<a href="http://example.com/about">About</a> <img src='http://example.com/blog/pic.png'> <a href="https://other.org/x">X</a> <a href="#top">Top</a>"##
        )
    );
}

#[test]
fn test_absolute_url_invalid_base() {
    let mut item = Item::new();
    item.set("link", json!("not a url"));
    let plugin = AbsoluteUrl::from_config(&json!({"source": "link"})).unwrap();
    let err = plugin
        .tamper(json!("<a href=\"/x\">x</a>"), Some(&mut item))
        .unwrap_err();
    assert!(err.to_string().contains("valid domain"));
    assert_eq!(plugin.used_source_properties(), vec!["link".to_string()]);
}

// ============================================================================
// Filter Plugins
// ============================================================================

#[test_case(json!({"words": "ipsum"}), json!("Lorem ipsum") => false ; "match keeps")]
#[test_case(json!({"words": "ipsum"}), json!("Ut wisi enim") => true ; "no match skips")]
#[test_case(json!({"words": "ipsum", "invert": true}), json!("Lorem ipsum") => true ; "inverted match skips")]
#[test_case(json!({"words": "IPSUM"}), json!("Lorem ipsum") => false ; "case insensitive by default")]
#[test_case(json!({"words": "IPSUM", "case_sensitive": true}), json!("Lorem ipsum") => true ; "case sensitive")]
#[test_case(json!({"words": "ips", "word_boundaries": true}), json!("Lorem ipsum") => true ; "word boundaries")]
#[test_case(json!({"words": "Lorem ipsum", "exact": true}), json!("Lorem ipsum") => false ; "exact")]
#[test_case(json!({"words": "Lorem", "exact": true}), json!("Lorem ipsum") => true ; "exact partial")]
#[test_case(json!({"words_list": ["foo", "bar"]}), json!(["x", "a bar"]) => false ; "any list element")]
#[test_case(json!({"words": "foo\r\n\n bar \n"}), json!("bar") => false ; "multiline words")]
fn test_keyword_filter_skips(config: JsonValue, input: JsonValue) -> bool {
    matches!(run::<KeywordFilter>(config, input).unwrap(), Tampered::SkipItem)
}

#[test_case(json!(null) => true ; "null")]
#[test_case(json!("") => true ; "empty string")]
#[test_case(json!([]) => true ; "empty list")]
#[test_case(json!(["", null]) => true ; "list of blanks")]
#[test_case(json!("0") => false ; "zero string")]
#[test_case(json!(0) => false ; "zero")]
#[test_case(json!("x") => false ; "text")]
fn test_required_skips(input: JsonValue) -> bool {
    matches!(run::<Required>(json!({}), input).unwrap(), Tampered::SkipItem)
}

#[test]
fn test_required_inverted() {
    assert_eq!(
        run::<Required>(json!({"invert": true}), json!("x")).unwrap(),
        Tampered::SkipItem
    );
    assert_eq!(
        run::<Required>(json!({"invert": true}), json!("")).unwrap(),
        Tampered::Value(json!(""))
    );
}

// ============================================================================
// Number Plugins
// ============================================================================

#[test_case(json!({"operation": "addition", "value": 3}), json!(2) => json!(5) ; "addition")]
#[test_case(json!({"operation": "subtraction", "value": 3}), json!("10") => json!(7) ; "numeric string")]
#[test_case(json!({"operation": "multiplication", "value": 1.5}), json!(2) => json!(3) ; "multiplication")]
#[test_case(json!({"operation": "division", "value": 4}), json!(10) => json!(2.5) ; "division")]
#[test_case(json!({"operation": "subtraction", "value": 10, "flip": true}), json!(3) => json!(7) ; "flipped subtraction")]
#[test_case(json!({"operation": "division", "value": 10, "flip": true}), json!(4) => json!(2.5) ; "flipped division")]
#[test_case(json!({"operation": "addition", "value": 1}), json!(null) => json!(1) ; "null is zero")]
#[test_case(json!({"operation": "addition", "value": 1}), json!(true) => json!(2) ; "true is one")]
#[test_case(json!({"operation": "addition", "value": 1, "skip_on_nan": true}), json!("abc") => json!("abc") ; "skip on nan")]
fn test_math(config: JsonValue, input: JsonValue) -> JsonValue {
    run_value::<Math>(config, input)
}

#[test]
fn test_math_errors() {
    let err = run::<Math>(json!({"value": 1}), json!("abc")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Math plugin failed because data was not numeric."
    );

    let err = run::<Math>(
        json!({"operation": "division", "value": 5, "flip": true}),
        json!(0),
    )
    .unwrap_err();
    assert!(err.to_string().contains("divide by zero"));

    assert!(run::<Math>(json!({"operation": "division", "value": 0}), json!(5)).is_err());
}

// ============================================================================
// Date Plugins
// ============================================================================

#[test_case(json!({}), "2020-01-01" => json!(1_577_836_800) ; "date")]
#[test_case(json!({}), "2020-01-01 00:01:00" => json!(1_577_836_860) ; "datetime")]
#[test_case(json!({}), "2020-01-01T00:00:00+01:00" => json!(1_577_833_200) ; "rfc3339")]
#[test_case(json!({}), "@86400" => json!(86_400) ; "timestamp")]
#[test_case(json!({"date_format": "%d/%m/%Y"}), "02/01/2020" => json!(1_577_923_200) ; "custom format")]
fn test_strtotime(config: JsonValue, input: &str) -> JsonValue {
    run_value::<StrToTime>(config, json!(input))
}

#[test]
fn test_strtotime_failures() {
    assert!(run::<StrToTime>(json!({}), json!("not a date")).is_err());
    assert!(run::<StrToTime>(json!({"date_format": "%d/%m/%Y"}), json!("2020-01-01")).is_err());
    assert_eq!(
        run_value::<StrToTime>(
            json!({"date_format": "%d/%m/%Y", "fallback": true}),
            json!("2020-01-01")
        ),
        json!(1_577_836_800)
    );
    assert_eq!(run_value::<StrToTime>(json!({}), json!("")), json!(""));
}

// ============================================================================
// Other Plugins
// ============================================================================

#[test_case(json!({"default_value": "n/a"}), json!("x") => json!("n/a") ; "always")]
#[test_case(json!({"default_value": "n/a", "only_if_empty": true}), json!("x") => json!("x") ; "kept when set")]
#[test_case(json!({"default_value": "n/a", "only_if_empty": true}), json!("") => json!("n/a") ; "replaced when empty")]
#[test_case(json!({"default_value": [1, 2], "only_if_empty": true}), json!(null) => json!([1, 2]) ; "list default")]
fn test_default_value(config: JsonValue, input: JsonValue) -> JsonValue {
    run_value::<DefaultValue>(config, input)
}

#[test_case(json!({}), "TRUE" => json!(true) ; "truth ignores case")]
#[test_case(json!({}), "false" => json!(false) ; "false value")]
#[test_case(json!({}), "maybe" => json!(false) ; "no match defaults to false")]
#[test_case(json!({"match_case": true}), "TRUE" => json!(false) ; "match case")]
#[test_case(json!({"no_match": "pass"}), "maybe" => json!("maybe") ; "pass")]
#[test_case(json!({"no_match": "null"}), "maybe" => json!(null) ; "null")]
#[test_case(json!({"no_match": "other", "other_text": "unknown"}), "maybe" => json!("unknown") ; "other text")]
#[test_case(json!({"truth_value": "Yes", "false_value": "No"}), "yes" => json!(true) ; "custom values")]
fn test_convert_boolean(config: JsonValue, input: &str) -> JsonValue {
    run_value::<ConvertBoolean>(config, json!(input))
}

#[test]
fn test_copy_to_and_from() {
    let mut item = Item::new();
    item.set("title", json!("Foo"));
    item.set("other", json!("Bar"));

    let out = run_with_item::<CopySource>(
        json!({"source": "other", "to_from": "to"}),
        json!("Foo"),
        &mut item,
    );
    assert_eq!(out, json!("Foo"));
    assert_eq!(item.get("other"), &json!("Foo"));

    item.set("other", json!("Baz"));
    let out = run_with_item::<CopySource>(
        json!({"source": "other", "to_from": "from"}),
        json!("Foo"),
        &mut item,
    );
    assert_eq!(out, json!("Baz"));
}

#[test]
fn test_copy_used_source_properties() {
    let to = CopySource::new(item::CopyDirection::To, "other");
    let from = CopySource::new(item::CopyDirection::From, "other");
    assert!(to.used_source_properties().is_empty());
    assert_eq!(from.used_source_properties(), vec!["other".to_string()]);
}

#[test]
fn test_copy_without_item() {
    let err = run::<CopySource>(json!({"source": "other"}), json!("x")).unwrap_err();
    assert_eq!(err.to_string(), "The copy plugin requires a tamperable item.");
}

fn rewrite_item() -> Item {
    let mut item = Item::new();
    item.set("title", json!("Foo"));
    item.set("body", json!("Bar"));
    item.set("tags", json!(["x", "y"]));
    item.set("meta", json!({"category": "news"}));
    item
}

#[test_case("[title] - [body]", json!("ignored") => json!("Foo - Bar") ; "two sources")]
#[test_case("[_self]!", json!("Self") => json!("Self!") ; "self token")]
#[test_case("[nope][title]", json!("x") => json!("Foo") ; "unresolved token is empty")]
#[test_case("[meta.category]", json!("x") => json!("news") ; "dotted path")]
#[test_case("[tags]", json!("x") => json!("x") ; "list token flattens to first element")]
#[test_case("[_self]:[tags]", json!(["a", "b", "c"]) => json!(["a:x", "b:y", "c:"]) ; "element wise")]
#[test_case("{key}=[_self]", json!(["a", "b"]) => json!(["0=a", "1=b"]) ; "key placeholder")]
fn test_rewrite(text: &str, input: JsonValue) -> JsonValue {
    let mut item = rewrite_item();
    run_with_item::<Rewrite>(json!({ "text": text }), input, &mut item)
}

#[test]
fn test_rewrite_used_source_properties() {
    let plugin = Rewrite::new("[title] [meta.category] [pricing.{key}.price] [title]");
    assert_eq!(
        plugin.used_source_properties(),
        vec!["title".to_string(), "meta".to_string(), "pricing".to_string()]
    );
}

// ============================================================================
// Item Usage Contract
// ============================================================================

/// Counts every accessor call made on the wrapped item
struct SpyItem {
    inner: Item,
    calls: Cell<usize>,
}

impl SpyItem {
    fn new(inner: Item) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    fn was_used(&self) -> bool {
        self.calls.get() > 0
    }
}

impl TamperableItem for SpyItem {
    fn source(&self) -> ValueMap {
        self.calls.set(self.calls.get() + 1);
        self.inner.source()
    }

    fn source_property(&self, property: &str) -> JsonValue {
        self.calls.set(self.calls.get() + 1);
        self.inner.source_property(property)
    }

    fn set_source_property(&mut self, property: &str, data: JsonValue) {
        self.calls.set(self.calls.get() + 1);
        self.inner.set_source_property(property, data);
    }
}

fn contract_config(id: &str) -> JsonValue {
    match id {
        "aggregate" => json!({"function": "sum"}),
        "find_replace" => json!({"find": "o", "replace": "0"}),
        "encode" => json!({"mode": "base64_encode"}),
        "keyword_filter" => json!({"words": "foo"}),
        "math" => json!({"value": 1}),
        "default_value" => json!({"default_value": "x"}),
        "copy" => json!({"source": "other", "to_from": "from"}),
        "rewrite" => json!({"text": "[title]"}),
        "absolute_url" => json!({"source": "link"}),
        _ => JsonValue::Null,
    }
}

fn spy() -> SpyItem {
    let mut item = Item::new();
    item.set("title", json!("foo"));
    item.set("link", json!("http://example.com"));
    SpyItem::new(item)
}

#[test]
fn test_ignored_plugins_never_touch_the_item() {
    let registry = TamperRegistry::with_builtins();
    let ignored: Vec<_> = registry
        .sorted_definitions()
        .into_iter()
        .filter(|d| d.effective_item_usage().ignores_item())
        .map(|d| d.id.clone())
        .collect();
    assert!(!ignored.is_empty());

    for id in ignored {
        let plugin = registry.create(&id, &contract_config(&id)).unwrap();
        let mut item = spy();
        // Outcome does not matter, only the accessor calls
        let _ = plugin.tamper(json!("foo"), Some(&mut item));
        assert!(!item.was_used(), "{id} touched the item");
    }
}

#[test]
fn test_required_plugins_use_the_item() {
    let registry = TamperRegistry::with_builtins();
    let required: Vec<_> = registry
        .sorted_definitions()
        .into_iter()
        .filter(|d| d.effective_item_usage().requires_item())
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(required.len(), 3);

    for id in required {
        let plugin = registry.create(&id, &contract_config(&id)).unwrap();
        let mut item = spy();
        plugin.tamper(json!("<a href=\"/x\">foo</a>"), Some(&mut item)).unwrap();
        assert!(item.was_used(), "{id} never touched the item");
    }
}
