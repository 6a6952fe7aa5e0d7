use super::{api_error, GenerationError, GenerationRequest, TextGenerator};
use crate::providers::ProviderSettings;
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    settings: ProviderSettings,
    retry: RetryConfig,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, settings: ProviderSettings, retry: RetryConfig) -> Self {
        Self {
            http,
            settings,
            retry,
        }
    }

    async fn send_once(&self, api_key: &str, body: &MessagesRequest<'_>) -> Result<String, GenerationError> {
        let provider = self.settings.kind.label();
        let url = format!("{}/messages", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| GenerationError::Transport {
                provider: provider.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(api_error(provider, response).await);
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|source| GenerationError::MalformedResponse {
                    provider: provider.to_string(),
                    source,
                })?;

        // Replies may be split over several text blocks
        let text: Vec<String> = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse {
                provider: provider.to_string(),
            });
        }

        Ok(text.concat())
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(self.settings.kind.label().to_string()))?;

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: MAX_TOKENS,
            system: &request.system_prompt,
            messages: vec![Message {
                role: "user",
                content: &request.user_text,
            }],
        };

        with_retry(
            &self.retry,
            "Anthropic messages",
            || self.send_once(api_key, &body),
        )
        .await
    }
}
