use serde::Serialize;

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// `POST {base}/chat/completions`
    OpenAiChat,
    /// `POST {base}/messages`
    AnthropicMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    Groq,
    Mistral,
    Ollama,
    OpenAi,
    XAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Anthropic,
        ProviderKind::Groq,
        ProviderKind::Mistral,
        ProviderKind::Ollama,
        ProviderKind::OpenAi,
        ProviderKind::XAi,
    ];

    pub fn from_id(id: &str) -> Option<ProviderKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id.trim()))
    }

    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Groq => "groq",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
            ProviderKind::XAi => "xai",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Groq => "Groq",
            ProviderKind::Mistral => "Mistral",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::XAi => "xAI",
        }
    }

    pub fn protocol(self) -> Protocol {
        match self {
            ProviderKind::Anthropic => Protocol::AnthropicMessages,
            _ => Protocol::OpenAiChat,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Mistral => "https://api.mistral.ai/v1",
            ProviderKind::Ollama => "http://localhost:11434/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::XAi => "https://api.x.ai/v1",
        }
    }

    /// Environment variable holding the API key, if the provider takes one.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Mistral => Some("MISTRAL_API_KEY"),
            ProviderKind::Ollama => None,
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::XAi => Some("XAI_API_KEY"),
        }
    }

    /// Environment variable overriding the base URL.
    pub fn base_url_var(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_URL",
            ProviderKind::Groq => "GROQ_URL",
            ProviderKind::Mistral => "MISTRAL_URL",
            ProviderKind::Ollama => "OLLAMA_URL",
            ProviderKind::OpenAi => "OPENAI_URL",
            ProviderKind::XAi => "XAI_URL",
        }
    }
}

/// Resolved endpoint and credentials of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ProviderSettings {
    /// A provider is usable when it needs no key or its key is set.
    pub fn is_enabled(&self) -> bool {
        self.kind.api_key_var().is_none() || self.api_key.is_some()
    }
}

/// One entry of the provider picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOption {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

/// List every provider with its label, flagging the ones without credentials.
pub fn provider_options(providers: &[ProviderSettings]) -> Vec<ProviderOption> {
    providers
        .iter()
        .map(|settings| {
            let enabled = settings.is_enabled();
            let mut value = settings.kind.label().to_string();
            if !enabled {
                value.push_str(" ⚠️");
            }
            ProviderOption {
                key: settings.kind.id().to_string(),
                value,
                enabled,
            }
        })
        .collect()
}
