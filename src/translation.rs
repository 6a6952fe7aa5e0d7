use crate::error::TranslateError;
use crate::generation::{GenerationRequest, TextGenerator};
use crate::metrics::TranslationMetrics;
use crate::validator::TranslationValidator;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything a leaf translation needs, frozen for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSettings {
    pub provider: String,
    pub model: String,
    pub instructions: Option<String>,
    /// Display name of the target language, e.g. "French (Canada)"
    pub target_language: String,
    /// Delay imposed after every call to the service
    pub pacing: Duration,
}

/// Build the system prompt for one leaf translation
fn build_system_prompt(instructions: Option<&str>, target_language: &str) -> String {
    let mut prompt = String::from(
        "You are a translator that translates text from one language to another. \
         Keep the structure intact. Only translate the text. \
         Reply with just the translated text or HTML without any wrapper of any kind.",
    );

    if let Some(instructions) = instructions {
        prompt.push_str("\n\n#Style Instructions  \n");
        prompt.push_str(instructions);
    }

    prompt.push_str(&format!(
        "\n\nTranslate the following text to {}.",
        target_language
    ));
    prompt
}

/// Translates single text values through the text-generation service.
///
/// Calls are strictly sequential: each call waits for the service, then for
/// the configured pacing delay. Failures are not retried here.
pub struct LeafTranslator {
    generator: Arc<dyn TextGenerator>,
    settings: TranslationSettings,
    system_prompt: String,
    metrics: TranslationMetrics,
}

impl LeafTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: TranslationSettings) -> Self {
        let system_prompt =
            build_system_prompt(settings.instructions.as_deref(), &settings.target_language);
        Self {
            generator,
            settings,
            system_prompt,
            metrics: TranslationMetrics::new(),
        }
    }

    pub fn settings(&self) -> &TranslationSettings {
        &self.settings
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text`. `None` is returned unchanged without calling the service.
    pub async fn translate(&self, text: Option<&str>) -> Result<Option<String>, TranslateError> {
        let Some(text) = text else {
            self.metrics.record_passthrough();
            return Ok(None);
        };

        let request = GenerationRequest {
            provider: self.settings.provider.clone(),
            model: self.settings.model.clone(),
            system_prompt: self.system_prompt.clone(),
            user_text: text.to_string(),
        };

        self.metrics.record_leaf_call();
        debug!(
            "Translating {} chars to {}",
            text.chars().count(),
            self.settings.target_language
        );

        let translated = match self.generator.generate(&request).await {
            Ok(translated) => translated,
            Err(e) => {
                self.metrics.record_leaf_failure();
                return Err(e.into());
            }
        };

        if !self.settings.pacing.is_zero() {
            tokio::time::sleep(self.settings.pacing).await;
        }

        let validation = TranslationValidator::validate(text, &translated);
        if validation.has_warnings() {
            warn!(
                "Translation validation warnings for {}: {:?}",
                self.settings.target_language, validation.warnings
            );
        }
        if validation.has_errors() {
            warn!(
                "Translation validation errors for {}: {:?}",
                self.settings.target_language, validation.errors
            );
        }

        Ok(Some(translated))
    }

    /// Translate a raw document value as a leaf.
    ///
    /// Strings go to the service. `null`, numbers and booleans come back
    /// unchanged. Maps and lists are never sent and are returned as they are.
    pub async fn translate_value(&self, value: &Value) -> Result<Value, TranslateError> {
        match value {
            Value::String(text) => Ok(self
                .translate(Some(text))
                .await?
                .map(Value::String)
                .unwrap_or(Value::Null)),
            Value::Null => {
                self.translate(None).await?;
                Ok(Value::Null)
            }
            Value::Bool(_) | Value::Number(_) => {
                self.metrics.record_passthrough();
                Ok(value.clone())
            }
            Value::Array(_) | Value::Object(_) => {
                warn!("Refusing to translate a structured value as text");
                self.metrics.record_skipped_value();
                Ok(value.clone())
            }
        }
    }
}
