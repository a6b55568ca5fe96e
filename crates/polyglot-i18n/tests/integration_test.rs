//! Integration tests for polyglot-i18n crate.
//!
//! These tests drive catalogs, the compiler and the runtime together through
//! the public API.

use polyglot_common::test_utils::{create_temp_dir, init_test_logging, wait_until};
use polyglot_config::{BuildConfig, CatalogConfig, ParseErrorPolicy};
use polyglot_i18n::{
    ast_from_value, compile, format, set_current_locale, values, AstNode, AstTableParser,
    BuildPipeline, CallSite, CatalogManager, CompileError, CompiledMessage, FormatContext,
    FormatError, FormatterCache, Locale, MessageValues,
};
use proptest::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

const ITEMS: &str = "{count, plural, =0{no items} one{one item} other{# items}}";
const MORE: &str = "{count, plural, offset:1 one{the first} other{# more}}";

fn en() -> Locale {
    Locale::parse("en").unwrap()
}

fn context() -> FormatContext {
    FormatContext::new(en(), Arc::new(FormatterCache::new(64)))
}

fn items_ast() -> Vec<AstNode> {
    ast_from_value(json!([
        { "type": 6, "value": "count", "offset": 0, "options": {
            "=0": [{ "type": 0, "value": "no items" }],
            "one": [{ "type": 0, "value": "one item" }],
            "other": [{ "type": 7 }, { "type": 0, "value": " items" }]
        }}
    ]))
    .unwrap()
}

fn more_ast() -> Vec<AstNode> {
    ast_from_value(json!([
        { "type": 6, "value": "count", "offset": 1, "options": {
            "one": [{ "type": 0, "value": "the first" }],
            "other": [{ "type": 7 }, { "type": 0, "value": " more" }]
        }}
    ]))
    .unwrap()
}

fn parser() -> AstTableParser {
    let mut parser = AstTableParser::new();
    parser.insert(ITEMS, items_ast());
    parser.insert(MORE, more_ast());
    parser
}

fn manager(dir: &std::path::Path, debounce: Duration, watch: bool) -> CatalogManager {
    CatalogManager::open(&CatalogConfig {
        directory: dir.to_path_buf(),
        debounce_ms: u64::try_from(debounce.as_millis()).unwrap(),
        watch,
        ..CatalogConfig::default()
    })
    .unwrap()
}

#[test]
fn test_plural_with_exact_match() {
    let message = compile(&items_ast()).unwrap();
    let ctx = context();

    assert_eq!(message.render(&ctx, &values!("count" => 3)), "3 items");
    assert_eq!(message.render(&ctx, &values!("count" => 1)), "one item");
    assert_eq!(message.render(&ctx, &values!("count" => 0)), "no items");
}

#[test]
fn test_offset_plural() {
    let message = compile(&more_ast()).unwrap();
    let ctx = context();

    // The category comes from `count - 1`, so `one` is reached at 2.
    assert_eq!(message.render(&ctx, &values!("count" => 2)), "the first");
    assert_eq!(message.render(&ctx, &values!("count" => 1)), "0 more");
    assert_eq!(message.render(&ctx, &values!("count" => 4)), "3 more");
}

#[test]
fn test_offset_plural_in_french() {
    let message = compile(&more_ast()).unwrap();
    let ctx = context().with_locale(Locale::parse("fr").unwrap());

    // French puts 0 in `one`, so the first count past the offset reads "the first".
    assert_eq!(message.render(&ctx, &values!("count" => 1)), "the first");
    assert_eq!(message.render(&ctx, &values!("count" => 4)), "3 more");
}

#[test]
fn test_select_with_nested_number() {
    let ast = ast_from_value(json!([
        { "type": 5, "value": "gender", "options": {
            "female": [{ "type": 0, "value": "She paid " }, { "type": 2, "value": "amount" }],
            "other": [{ "type": 0, "value": "They paid " }, { "type": 2, "value": "amount" }]
        }}
    ]))
    .unwrap();
    let message = compile(&ast).unwrap();
    assert_eq!(message.params(), ["amount", "gender"]);

    let ctx = context();
    assert_eq!(
        message.render(&ctx, &values!("gender" => "female", "amount" => 1234.5)),
        "She paid 1,234.5"
    );
    assert_eq!(message.render(&ctx, &values!("amount" => 2)), "They paid 2");
}

#[test]
fn test_missing_key_round_trips_to_disk() {
    init_test_logging();
    let dir = create_temp_dir();
    let manager = manager(dir.path(), Duration::from_millis(50), false);

    assert_eq!(manager.get(&en(), "new.key").unwrap(), "new.key");

    let path = dir.path().join("en.json");
    assert!(wait_until(Duration::from_secs(5), || path.exists()));
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document, json!({ "new.key": "new.key" }));
}

#[test]
fn test_burst_of_misses_is_written_once() {
    init_test_logging();
    let dir = create_temp_dir();
    let manager = manager(dir.path(), Duration::from_millis(100), false);
    let catalog = manager.catalog(&en()).unwrap();

    for i in 0..20 {
        catalog.get(&format!("key.{i}"));
    }
    assert_eq!(catalog.pending_count(), 20);

    let path = dir.path().join("en.json");
    assert!(wait_until(Duration::from_secs(5), || catalog.pending_count() == 0));
    let document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.len(), 20);
}

#[test]
fn test_external_edit_is_picked_up() {
    init_test_logging();
    let dir = create_temp_dir();
    std::fs::write(dir.path().join("en.json"), r#"{"title": "Old"}"#).unwrap();
    let manager = manager(dir.path(), Duration::from_millis(50), true);
    assert_eq!(manager.get(&en(), "title").unwrap(), "Old");

    std::fs::write(dir.path().join("en.json"), r#"{"title": "New"}"#).unwrap();
    assert!(wait_until(Duration::from_secs(10), || {
        manager.get(&en(), "title").unwrap() == "New"
    }));
    assert!(manager.epoch(&en()) >= 1);
}

#[test]
fn test_pipeline_recompiles_after_reload() {
    let dir = create_temp_dir();
    std::fs::write(
        dir.path().join("en.json"),
        json!({ "items": ITEMS, "more": MORE }).to_string(),
    )
    .unwrap();
    let catalogs = Arc::new(manager(dir.path(), Duration::from_secs(60), false));
    let pipeline = BuildPipeline::new(
        Arc::clone(&catalogs),
        Arc::new(parser()),
        &BuildConfig::default(),
    )
    .unwrap();

    let first = pipeline.compile_key(&en(), "items").unwrap();
    assert!(Arc::ptr_eq(&first, &pipeline.compile_key(&en(), "items").unwrap()));

    std::fs::write(
        dir.path().join("en.json"),
        json!({ "items": MORE, "more": MORE }).to_string(),
    )
    .unwrap();
    catalogs.reload(&en()).unwrap();

    let second = pipeline.compile_key(&en(), "items").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.render(&context(), &values!("count" => 4)), "3 more");
}

#[test]
fn test_pipeline_module_output() {
    let dir = create_temp_dir();
    std::fs::write(dir.path().join("en.json"), json!({ "more": MORE }).to_string()).unwrap();
    let config = BuildConfig {
        on_parse_error: ParseErrorPolicy::Skip,
        ..BuildConfig::default()
    };
    let pipeline = BuildPipeline::new(
        Arc::new(manager(dir.path(), Duration::from_secs(60), false)),
        Arc::new(parser()),
        &config,
    )
    .unwrap();

    let module = pipeline
        .compile_module(&en(), &[CallSite::new("more").with_values("{ count: n }")])
        .unwrap();
    insta::assert_snapshot!(
        module.calls[0],
        @r#"_((count) => __offsetPlural(count, 1, {h: `${count - 1} more`, o: "the first"}), { count: n })"#
    );
    assert_eq!(
        module.import.as_deref(),
        Some(r#"import { __offsetPlural } from "polyglot/runtime";"#)
    );
}

#[test]
fn test_unknown_node_kind_is_a_defect() {
    let err = ast_from_value(json!([{ "type": 42 }])).unwrap_err();
    assert!(matches!(err, CompileError::InvalidAst(_)));
    assert!(err.is_defect());
}

#[test]
fn test_formatters_are_memoized() {
    let cache = FormatterCache::new(16);
    let a = cache.number(&en(), None).unwrap();
    let b = cache.number(&en(), None).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.constructions(), 1);

    let fr = Locale::parse("fr").unwrap();
    let c = cache.number(&fr, None).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.constructions(), 2);
}

#[test]
#[serial(current_locale)]
fn test_format_uses_current_locale() {
    polyglot_i18n::clear_current_locale();
    let message = compile(&items_ast()).unwrap();
    assert_eq!(
        format(&message, &values!("count" => 3)),
        Err(FormatError::LocaleNotSet)
    );

    set_current_locale(en());
    assert_eq!(format(&message, &values!("count" => 3)).unwrap(), "3 items");
    assert_eq!(
        format(&CompiledMessage::Constant("Hi".into()), &MessageValues::new()).unwrap(),
        "Hi"
    );
    polyglot_i18n::clear_current_locale();
}

fn param_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    #[test]
    fn prop_params_are_sorted_and_unique(names in prop::collection::vec(param_name(), 1..8)) {
        let ast: Vec<AstNode> = names
            .iter()
            .map(|name| AstNode::Interpolation { param: name.clone() })
            .collect();
        let message = compile(&ast).unwrap();

        let mut expected = names.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(message.params(), expected.as_slice());

        let mut reversed = ast;
        reversed.reverse();
        let reordered = compile(&reversed).unwrap();
        prop_assert_eq!(reordered.params(), message.params());
    }
}
