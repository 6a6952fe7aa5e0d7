//! Integration tests for the content translation engine
//!
//! These tests drive the translate action end to end: an item file on disk,
//! a blueprint, a mocked (or wiremock-backed) text-generation service, and
//! the merged document written back.

use ai_content_translate::config::{Config, UnknownVariantPolicy};
use ai_content_translate::generation::{MockGenerator, ProviderRouter};
use ai_content_translate::providers::{ProviderKind, ProviderSettings};
use ai_content_translate::retry::RetryConfig;
use ai_content_translate::store::{Document, JsonFileItem};
use ai_content_translate::{TranslateAction, TranslateError};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ==================== Test Helpers ====================

fn test_config() -> Config {
    Config {
        provider: Some("openai".to_string()),
        model: Some("gpt-4o-mini".to_string()),
        instructions: None,
        pacing: Duration::ZERO,
        unknown_variant: UnknownVariantPolicy::Keep,
        providers: Vec::new(),
    }
}

/// Write an item file into `dir` and return its path
fn write_item(dir: &TempDir, item: Value) -> PathBuf {
    let path = dir.path().join("item.json");
    std::fs::write(&path, serde_json::to_string_pretty(&item).unwrap())
        .expect("Failed to write item");
    path
}

fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).expect("Failed to read item"))
        .expect("Item should be JSON")
}

async fn run_action(action: &TranslateAction, path: &PathBuf) -> Result<Value, TranslateError> {
    let item = JsonFileItem::load(path).expect("Failed to load item");
    let mut items = [item];
    let result = action.run(&mut items, &Document::new()).await?;
    Ok(serde_json::to_value(result).unwrap())
}

fn page_blueprint() -> Value {
    json!([
        {"handle": "title", "field": {"type": "text", "localizable": true}},
        {"handle": "body", "field": {"type": "bard", "localizable": true}},
        {"handle": "hero", "field": {"type": "group", "localizable": true, "fields": [
            {"handle": "headline", "field": {"type": "text"}},
            {"handle": "image", "field": {"type": "assets"}}
        ]}},
        {"handle": "faq", "field": {"type": "grid", "localizable": true, "fields": [
            {"handle": "question", "field": {"type": "text"}},
            {"handle": "answer", "field": {"type": "textarea"}}
        ]}},
        {"handle": "tags", "field": {"type": "taggable", "localizable": true}},
        {"handle": "specs", "field": {"type": "table", "localizable": true}},
        {"handle": "blocks", "field": {"type": "replicator", "localizable": true, "sets": {
            "content": {"sets": {
                "quote": {"fields": [
                    {"handle": "author", "field": {"type": "users"}},
                    {"handle": "text", "field": {"type": "text"}}
                ]}
            }}
        }}},
        {"handle": "published", "field": {"type": "toggle", "localizable": true}}
    ])
}

// ==================== End-to-End Tests ====================

#[tokio::test]
async fn test_end_to_end_title_and_body() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": [
                {"handle": "title", "field": {"type": "text", "localizable": true}},
                {"handle": "body", "field": {"type": "bard", "localizable": true}}
            ],
            "origin": {"title": "Hello World", "body": "<p>Welcome</p>"},
            "data": {}
        }),
    );
    let mock = Arc::new(MockGenerator::with_mappings(
        [("Hello World", "Bonjour le monde"), ("<p>Welcome</p>", "<p>Bienvenue</p>")],
        "[fr]",
    ));
    let action = TranslateAction::new(test_config(), mock.clone());

    let result = run_action(&action, &path).await.expect("Should translate");

    assert_eq!(result, json!({"message": false, "callback": ["reloadPage"]}));
    let saved = read_json(&path);
    assert_eq!(
        saved["data"],
        json!({"title": "Bonjour le monde", "body": "<p>Bienvenue</p>"})
    );
    for request in mock.requests() {
        assert!(request
            .system_prompt
            .ends_with("Translate the following text to French."));
        assert_eq!(request.provider, "openai");
        assert_eq!(request.model, "gpt-4o-mini");
    }
}

#[tokio::test]
async fn test_full_page_translation() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "de_CH",
            "blueprint": page_blueprint(),
            "origin": {
                "title": "Pricing",
                "hero": {"headline": "Plans", "image": "hero.png"},
                "faq": [
                    {"id": "faq-1", "question": "Refunds?", "answer": "Yes."},
                    {"question": "Trials?", "answer": "14 days."}
                ],
                "tags": ["pricing", "plans"],
                "specs": [{"cells": ["Seats", "10"]}],
                "blocks": [{"id": "b1", "type": "quote", "author": "ceo", "text": "Simple."}],
                "published": true
            },
            "data": {"title": "Preise"}
        }),
    );
    let mock = Arc::new(MockGenerator::prefixed("[de]"));
    let action = TranslateAction::new(test_config(), mock.clone());

    run_action(&action, &path).await.expect("Should translate");

    let data = read_json(&path)["data"].clone();
    assert_eq!(data["title"], json!("Preise"));
    assert_eq!(data["hero"], json!({"headline": "[de] Plans", "image": "hero.png"}));
    assert_eq!(data["faq"][0]["id"], json!("faq-1"));
    assert_eq!(data["faq"][0]["question"], json!("[de] Refunds?"));
    assert_eq!(data["faq"][1]["answer"], json!("[de] 14 days."));
    assert!(data["faq"][1]["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(data["tags"], json!(["[de] pricing", "[de] plans"]));
    assert_eq!(data["specs"], json!([{"cells": ["[de] Seats", "[de] 10"]}]));
    assert_eq!(
        data["blocks"],
        json!([{"id": "b1", "type": "quote", "author": "ceo", "text": "[de] Simple.", "enabled": true}])
    );
    assert!(data.get("published").is_none());
    assert!(data.get("body").is_none());
    assert!(mock.requests()[0]
        .system_prompt
        .ends_with("Translate the following text to German (Switzerland)."));
}

// ==================== Property Tests ====================

#[tokio::test]
async fn test_already_translated_fields_are_untouched() {
    let dir = TempDir::new().unwrap();
    let existing = json!({
        "title": "Tarifs",
        "hero": {"headline": "Offres"},
        "tags": ["déjà"]
    });
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": page_blueprint(),
            "origin": {
                "title": "Pricing",
                "hero": {"headline": "Plans"},
                "tags": ["pricing"]
            },
            "data": existing
        }),
    );
    let mock = Arc::new(MockGenerator::prefixed("[fr]"));
    let action = TranslateAction::new(test_config(), mock.clone());

    run_action(&action, &path).await.expect("Should translate");

    assert_eq!(read_json(&path)["data"], existing);
    assert_eq!(mock.call_count(), 0);

    // A second run changes nothing either
    run_action(&action, &path).await.expect("Should translate");
    assert_eq!(read_json(&path)["data"], existing);
}

#[tokio::test]
async fn test_missing_origin_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": page_blueprint(),
            "data": {"title": "Tarifs"}
        }),
    );
    let before = std::fs::read_to_string(&path).unwrap();
    let mock = Arc::new(MockGenerator::prefixed("[fr]"));
    let action = TranslateAction::new(test_config(), mock.clone());

    let err = run_action(&action, &path).await.expect_err("Should fail");

    assert_eq!(
        err.to_string(),
        "This action is only available for items with an origin."
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": page_blueprint(),
            "origin": {"title": "Pricing", "tags": ["a", "b"]},
            "data": {}
        }),
    );
    let before = std::fs::read_to_string(&path).unwrap();
    let action = TranslateAction::new(
        test_config(),
        Arc::new(MockGenerator::failing(401, "Invalid API key")),
    );

    let err = run_action(&action, &path).await.expect_err("Should fail");

    assert!(matches!(err, TranslateError::GenerationFailed(_)));
    assert!(!err.is_retryable());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_unknown_set_policy_fail_aborts_run() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": page_blueprint(),
            "origin": {"title": "Pricing", "blocks": [{"type": "video", "url": "x"}]},
            "data": {}
        }),
    );
    let before = std::fs::read_to_string(&path).unwrap();
    let config = Config {
        unknown_variant: UnknownVariantPolicy::Fail,
        ..test_config()
    };
    let action = TranslateAction::new(config, Arc::new(MockGenerator::prefixed("[fr]")));

    let err = run_action(&action, &path).await.expect_err("Should fail");

    assert!(matches!(err, TranslateError::UnresolvableVariant { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_containers_are_never_sent_whole() {
    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": page_blueprint(),
            "origin": {
                "hero": {"headline": "Plans"},
                "faq": [{"question": "Q", "answer": "A"}],
                "tags": ["t"],
                "specs": [{"cells": ["c"]}]
            },
            "data": {}
        }),
    );
    let mock = Arc::new(MockGenerator::prefixed("[fr]"));
    let action = TranslateAction::new(test_config(), mock.clone());

    run_action(&action, &path).await.expect("Should translate");

    for text in mock.texts() {
        assert!(
            serde_json::from_str::<Value>(&text).map_or(true, |v| !v.is_object() && !v.is_array()),
            "Structured value sent as text: {}",
            text
        );
    }
    assert_eq!(mock.texts(), vec!["Plans", "Q", "A", "t", "c"]);
}

// ==================== HTTP Provider Tests ====================

#[tokio::test]
async fn test_translation_through_openai_compatible_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "llama-3.1-8b-instant"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Bonjour"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let providers = vec![ProviderSettings {
        kind: ProviderKind::Groq,
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
    }];
    let router = ProviderRouter::new(&providers, RetryConfig::single_attempt());
    let config = Config {
        provider: Some("groq".to_string()),
        model: Some("llama-3.1-8b-instant".to_string()),
        ..test_config()
    };
    let action = TranslateAction::new(config, Arc::new(router));

    let dir = TempDir::new().unwrap();
    let path = write_item(
        &dir,
        json!({
            "kind": "entry",
            "locale": "fr",
            "blueprint": [{"handle": "title", "field": {"type": "text", "localizable": true}}],
            "origin": {"title": "Hello"},
            "data": {}
        }),
    );

    run_action(&action, &path).await.expect("Should translate");

    assert_eq!(read_json(&path)["data"], json!({"title": "Bonjour"}));
}

// ==================== Ordering Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_list_translation_keeps_length_and_order(values in prop::collection::vec("[a-z]{1,8}", 0..12)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(test_config(), mock);

        let dir = TempDir::new().unwrap();
        let path = write_item(
            &dir,
            json!({
                "kind": "entry",
                "locale": "fr",
                "blueprint": [{"handle": "steps", "field": {"type": "list", "localizable": true}}],
                "origin": {"steps": values.clone()},
                "data": {}
            }),
        );

        runtime.block_on(run_action(&action, &path)).unwrap();

        let expected: Vec<String> = values.iter().map(|v| format!("[fr] {}", v)).collect();
        prop_assert_eq!(read_json(&path)["data"]["steps"].clone(), json!(expected));
    }

    #[test]
    fn prop_table_translation_keeps_shape(rows in prop::collection::vec(prop::collection::vec("[a-z]{1,6}", 0..5), 0..6)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(test_config(), mock);

        let origin_rows: Vec<Value> = rows.iter().map(|cells| json!({"cells": cells})).collect();
        let dir = TempDir::new().unwrap();
        let path = write_item(
            &dir,
            json!({
                "kind": "entry",
                "locale": "fr",
                "blueprint": [{"handle": "specs", "field": {"type": "table", "localizable": true}}],
                "origin": {"specs": origin_rows},
                "data": {}
            }),
        );

        runtime.block_on(run_action(&action, &path)).unwrap();

        let saved = read_json(&path)["data"]["specs"].clone();
        let saved_rows = saved.as_array().unwrap();
        prop_assert_eq!(saved_rows.len(), rows.len());
        for (saved_row, cells) in saved_rows.iter().zip(&rows) {
            let expected: Vec<String> = cells.iter().map(|c| format!("[fr] {}", c)).collect();
            prop_assert_eq!(saved_row["cells"].clone(), json!(expected));
        }
    }
}
