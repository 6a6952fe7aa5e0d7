mod anthropic;
mod mock;
mod openai;

pub use anthropic::AnthropicClient;
pub use mock::{MockGenerator, MockMode};
pub use openai::OpenAiChatClient;

use crate::config::Config;
use crate::providers::{ProviderKind, ProviderSettings, Protocol};
use crate::retry::{RetryConfig, Retryable};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One text-in/text-out call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub provider: String,
    pub model: String,
    pub system_prompt: String,
    pub user_text: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to reach {provider}: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
        /// Wait requested through the `Retry-After` header
        retry_after: Option<Duration>,
    },

    #[error("Failed to parse {provider} response: {source}")]
    MalformedResponse {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} response contained no text")]
    EmptyResponse { provider: String },

    #[error("Unsupported translation provider '{0}'")]
    UnsupportedProvider(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(String),
}

impl Retryable for GenerationError {
    /// Network failures, rate limits (429) and server errors (5xx) are transient.
    /// Other client errors and local misconfiguration are not.
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Transport { .. } => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::MalformedResponse { .. }
            | GenerationError::EmptyResponse { .. }
            | GenerationError::UnsupportedProvider(_)
            | GenerationError::MissingApiKey(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            GenerationError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `request.user_text` under `request.system_prompt`,
    /// returned verbatim.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Routes each request to the HTTP client of the provider it names.
pub struct ProviderRouter {
    clients: HashMap<&'static str, Arc<dyn TextGenerator>>,
}

impl ProviderRouter {
    pub fn new(providers: &[ProviderSettings], retry: RetryConfig) -> Self {
        let http = reqwest::Client::new();
        let clients = providers
            .iter()
            .map(|settings| {
                let client: Arc<dyn TextGenerator> = match settings.kind.protocol() {
                    Protocol::OpenAiChat => Arc::new(OpenAiChatClient::new(
                        http.clone(),
                        settings.clone(),
                        retry.clone(),
                    )),
                    Protocol::AnthropicMessages => Arc::new(AnthropicClient::new(
                        http.clone(),
                        settings.clone(),
                        retry.clone(),
                    )),
                };
                (settings.kind.id(), client)
            })
            .collect();

        Self { clients }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.providers, RetryConfig::provider_call())
    }
}

#[async_trait]
impl TextGenerator for ProviderRouter {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let client = ProviderKind::from_id(&request.provider)
            .and_then(|kind| self.clients.get(kind.id()))
            .ok_or_else(|| GenerationError::UnsupportedProvider(request.provider.clone()))?;

        client.generate(request).await
    }
}

/// Read a failed response into an [`GenerationError::Api`].
pub(crate) async fn api_error(provider: &str, response: reqwest::Response) -> GenerationError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_retry_after);
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));

    GenerationError::Api {
        provider: provider.to_string(),
        status,
        body,
        retry_after,
    }
}

/// `Retry-After` in seconds. The HTTP-date form is not supported.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}
