use crate::providers::{ProviderKind, ProviderSettings};
use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Delay imposed after every leaf translation call.
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// What to do with a set element whose `type` is not declared by its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownVariantPolicy {
    /// Copy the element through untranslated.
    #[default]
    Keep,
    /// Abort the run.
    Fail,
}

impl UnknownVariantPolicy {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(UnknownVariantPolicy::Keep),
            "fail" => Ok(UnknownVariantPolicy::Fail),
            other => bail!("AI_TRANSLATIONS_UNKNOWN_SET must be 'keep' or 'fail', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Translation service selection
    pub provider: Option<String>,
    pub model: Option<String>,

    // Prompt
    pub instructions: Option<String>,

    // Throttling
    pub pacing: Duration,

    pub unknown_variant: UnknownVariantPolicy,

    // Provider endpoints and credentials
    pub providers: Vec<ProviderSettings>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let pacing = match var("AI_TRANSLATIONS_PACING_MS") {
            Some(value) => Duration::from_millis(
                value
                    .parse()
                    .with_context(|| format!("Invalid AI_TRANSLATIONS_PACING_MS: '{}'", value))?,
            ),
            None => DEFAULT_PACING,
        };

        let unknown_variant = match var("AI_TRANSLATIONS_UNKNOWN_SET") {
            Some(value) => UnknownVariantPolicy::parse(&value)?,
            None => UnknownVariantPolicy::default(),
        };

        let providers = ProviderKind::ALL
            .into_iter()
            .map(|kind| ProviderSettings {
                kind,
                base_url: var(kind.base_url_var())
                    .unwrap_or_else(|| kind.default_base_url().to_string()),
                api_key: kind.api_key_var().and_then(var),
            })
            .collect();

        Ok(Self {
            provider: var("AI_TRANSLATIONS_PROVIDER"),
            model: var("AI_TRANSLATIONS_MODEL"),
            instructions: var("AI_TRANSLATIONS_INSTRUCTIONS"),
            pacing,
            unknown_variant,
            providers,
        })
    }

    /// Both a provider and a model are selected.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some() && self.model.is_some()
    }

    pub fn provider_settings(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.iter().find(|settings| settings.kind == kind)
    }
}
