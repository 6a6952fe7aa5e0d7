use super::{api_error, GenerationError, GenerationRequest, TextGenerator};
use crate::providers::ProviderSettings;
use crate::retry::{with_retry, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OpenAI-style chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for providers speaking the OpenAI chat-completions protocol
/// (OpenAI, Groq, Mistral, Ollama, xAI).
pub struct OpenAiChatClient {
    http: reqwest::Client,
    settings: ProviderSettings,
    retry: RetryConfig,
}

impl OpenAiChatClient {
    pub fn new(http: reqwest::Client, settings: ProviderSettings, retry: RetryConfig) -> Self {
        Self {
            http,
            settings,
            retry,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, GenerationError> {
        let provider = self.settings.kind.label();

        let mut builder = self
            .http
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.settings.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| GenerationError::Transport {
                provider: provider.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(api_error(provider, response).await);
        }

        let chat_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|source| GenerationError::MalformedResponse {
                    provider: provider.to_string(),
                    source,
                })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::EmptyResponse {
                provider: provider.to_string(),
            })
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if !self.settings.is_enabled() {
            return Err(GenerationError::MissingApiKey(
                self.settings.kind.label().to_string(),
            ));
        }

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_text,
                },
            ],
        };

        with_retry(
            &self.retry,
            &format!("{} chat completion", self.settings.kind.label()),
            || self.send_once(&body),
        )
        .await
    }
}
