use super::{GenerationError, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// How the mock answers a request
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Prepend a marker: "Hello" → "[fr] Hello"
    Prefix(String),

    /// Look up the user text; unknown texts fall back to `Prefix`-style output
    /// with the given fallback marker
    Mappings {
        mappings: HashMap<String, String>,
        fallback: String,
    },

    /// Return the user text unchanged
    Echo,

    /// Fail every call with an API error
    Fail { status: u16, body: String },
}

#[derive(Debug)]
pub struct MockGenerator {
    mode: MockMode,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Prefix every reply with `marker` and a space.
    pub fn prefixed(marker: &str) -> Self {
        Self::new(MockMode::Prefix(marker.to_string()))
    }

    pub fn with_mappings<I, K, V>(mappings: I, fallback: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(MockMode::Mappings {
            mappings: mappings
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            fallback: fallback.to_string(),
        })
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self::new(MockMode::Fail {
            status,
            body: body.to_string(),
        })
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// The user texts received so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.user_text)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|requests| requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.mode {
            MockMode::Prefix(marker) => Ok(format!("{} {}", marker, request.user_text)),
            MockMode::Mappings { mappings, fallback } => Ok(mappings
                .get(&request.user_text)
                .cloned()
                .unwrap_or_else(|| format!("{} {}", fallback, request.user_text))),
            MockMode::Echo => Ok(request.user_text.clone()),
            MockMode::Fail { status, body } => Err(GenerationError::Api {
                provider: request.provider.clone(),
                status: *status,
                body: body.clone(),
                retry_after: None,
            }),
        }
    }
}
