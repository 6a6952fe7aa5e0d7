use crate::config::Config;
use crate::dispatch::FieldTranslator;
use crate::error::TranslateError;
use crate::gap::handles_to_translate;
use crate::generation::{ProviderRouter, TextGenerator};
use crate::locale::LocaleRegistry;
use crate::resolver::{resolve, ResolutionContext};
use crate::store::{ContentItem, Document, ItemKind};
use crate::translation::{LeafTranslator, TranslationSettings};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// What the triggering caller gets back after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub message: bool,
    pub callback: Vec<String>,
}

impl ActionResult {
    /// No message, ask the caller to reload the page.
    pub fn reload_page() -> Self {
        Self {
            message: false,
            callback: vec!["reloadPage".to_string()],
        }
    }
}

pub struct TranslateAction {
    config: Config,
    generator: Arc<dyn TextGenerator>,
}

impl TranslateAction {
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    /// Action backed by the HTTP providers of `config`.
    pub fn from_config(config: Config) -> Self {
        let generator = Arc::new(ProviderRouter::from_config(&config));
        Self::new(config, generator)
    }

    pub fn title() -> &'static str {
        "AI Translations"
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Offered only on entries, and only once a provider and model are set.
    pub fn visible_to(&self, item: &dyn ContentItem) -> bool {
        item.kind() == ItemKind::Entry && self.config.is_configured()
    }

    /// Translate the first of `items` from its origin and save it.
    ///
    /// `values` are the operator's form values; the action has none and
    /// ignores them. On any failure nothing is saved.
    pub async fn run<I: ContentItem>(
        &self,
        items: &mut [I],
        _values: &Document,
    ) -> Result<ActionResult, TranslateError> {
        let item = items.first_mut().ok_or(TranslateError::NoItem)?;

        let origin = match item.origin_data() {
            Some(origin) if item.has_origin() => origin.clone(),
            _ => return Err(TranslateError::PreconditionFailed),
        };

        let (Some(provider), Some(model)) = (&self.config.provider, &self.config.model) else {
            return Err(TranslateError::NotConfigured);
        };

        let target_language = LocaleRegistry::get().display_name(item.locale());
        info!(
            "Translating {} item to {} with {}/{}",
            item.locale(),
            target_language,
            provider,
            model
        );

        let leaf = LeafTranslator::new(
            Arc::clone(&self.generator),
            TranslationSettings {
                provider: provider.clone(),
                model: model.clone(),
                instructions: self.config.instructions.clone(),
                target_language,
                pacing: self.config.pacing,
            },
        );
        let translator = FieldTranslator::new(&leaf, self.config.unknown_variant);

        let current = Value::Object(item.data().clone());
        let translated = {
            let tree = resolve(item.blueprint(), ResolutionContext::Root);
            let handles = handles_to_translate(&tree, &current);
            info!(
                "{} of {} translatable fields need translation",
                handles.len(),
                tree.len()
            );
            debug!("Fields to translate: {:?}", handles);

            translator
                .translate_fields(&origin, &current, &tree, &handles)
                .await?
        };

        let mut merged = match current {
            Value::Object(current) => current,
            _ => Document::new(),
        };
        let translated_fields = translated.len();
        merged.extend(translated);

        item.set_data(merged);
        item.save()?;

        let report = leaf.metrics().report();
        info!(
            "Translated {} fields ({} leaf calls, {} skipped values, {} unresolved sets)",
            translated_fields, report.leaf_calls, report.skipped_values, report.unresolved_variants
        );

        Ok(ActionResult::reload_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownVariantPolicy;
    use crate::generation::MockGenerator;
    use crate::schema::FieldDescriptor;
    use crate::store::MemoryItem;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            provider: Some("openai".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            instructions: None,
            pacing: Duration::ZERO,
            unknown_variant: UnknownVariantPolicy::Keep,
            providers: Vec::new(),
        }
    }

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {}", other),
        }
    }

    fn item(origin: Option<Value>, data: Value) -> MemoryItem {
        let blueprint: Vec<FieldDescriptor> = serde_json::from_value(json!([
            {"handle": "title", "field": {"type": "text", "localizable": true}},
            {"handle": "body", "field": {"type": "markdown", "localizable": true}},
            {"handle": "date", "field": {"type": "date", "localizable": true}}
        ]))
        .expect("Blueprint should parse");

        MemoryItem {
            kind: ItemKind::Entry,
            locale: "fr".to_string(),
            blueprint,
            origin: origin.map(document),
            data: document(data),
            saves: 0,
        }
    }

    #[test]
    fn test_action_result_serialization() {
        let json = serde_json::to_value(ActionResult::reload_page()).expect("Should serialize");
        assert_eq!(json, json!({"message": false, "callback": ["reloadPage"]}));
    }

    #[test]
    fn test_visible_only_for_configured_entries() {
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(config(), mock.clone());

        let mut entry = item(None, json!({}));
        assert!(action.visible_to(&entry));

        entry.kind = ItemKind::Term;
        assert!(!action.visible_to(&entry));

        let unconfigured = TranslateAction::new(
            Config {
                model: None,
                ..config()
            },
            mock,
        );
        entry.kind = ItemKind::Entry;
        assert!(!unconfigured.visible_to(&entry));
    }

    #[tokio::test]
    async fn test_run_translates_missing_fields_and_saves() {
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(config(), mock.clone());
        let mut items = vec![item(
            Some(json!({"title": "Hello", "body": "Intro", "date": "2024-01-01"})),
            json!({"title": "Bonjour", "slug": "bonjour"}),
        )];

        let result = action
            .run(&mut items, &Document::new())
            .await
            .expect("Should translate");

        assert_eq!(result, ActionResult::reload_page());
        assert_eq!(
            Value::Object(items[0].data.clone()),
            json!({"title": "Bonjour", "slug": "bonjour", "body": "[fr] Intro"})
        );
        assert_eq!(items[0].saves, 1);
        assert_eq!(mock.texts(), vec!["Intro"]);
        assert!(mock.requests()[0]
            .system_prompt
            .ends_with("Translate the following text to French."));
    }

    #[tokio::test]
    async fn test_run_without_items() {
        let action = TranslateAction::new(config(), Arc::new(MockGenerator::prefixed("[fr]")));
        let mut items: Vec<MemoryItem> = Vec::new();

        let result = action.run(&mut items, &Document::new()).await;

        assert!(matches!(result, Err(TranslateError::NoItem)));
    }

    #[tokio::test]
    async fn test_run_without_origin_fails_and_saves_nothing() {
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(config(), mock.clone());
        let mut items = vec![item(None, json!({"title": "Bonjour"}))];

        let result = action.run(&mut items, &Document::new()).await;

        let err = result.expect_err("Should fail");
        assert!(matches!(err, TranslateError::PreconditionFailed));
        assert_eq!(
            err.to_string(),
            "This action is only available for items with an origin."
        );
        assert_eq!(items[0].saves, 0);
        assert_eq!(Value::Object(items[0].data.clone()), json!({"title": "Bonjour"}));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_requires_configured_service() {
        let action = TranslateAction::new(
            Config {
                provider: None,
                ..config()
            },
            Arc::new(MockGenerator::prefixed("[fr]")),
        );
        let mut items = vec![item(Some(json!({"title": "Hello"})), json!({}))];

        let result = action.run(&mut items, &Document::new()).await;

        assert!(matches!(result, Err(TranslateError::NotConfigured)));
        assert_eq!(items[0].saves, 0);
    }

    #[tokio::test]
    async fn test_generation_failure_saves_nothing() {
        let action = TranslateAction::new(config(), Arc::new(MockGenerator::failing(500, "down")));
        let mut items = vec![item(Some(json!({"title": "Hello"})), json!({}))];

        let result = action.run(&mut items, &Document::new()).await;

        let err = result.expect_err("Should fail");
        assert!(matches!(err, TranslateError::GenerationFailed(_)));
        assert!(err.is_retryable());
        assert_eq!(items[0].saves, 0);
        assert!(items[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_run_only_uses_first_item() {
        let mock = Arc::new(MockGenerator::prefixed("[fr]"));
        let action = TranslateAction::new(config(), mock);
        let mut items = vec![
            item(Some(json!({"title": "First"})), json!({})),
            item(Some(json!({"title": "Second"})), json!({})),
        ];

        action
            .run(&mut items, &Document::new())
            .await
            .expect("Should translate");

        assert_eq!(items[0].data["title"], json!("[fr] First"));
        assert!(items[1].data.is_empty());
        assert_eq!(items[1].saves, 0);
    }
}
