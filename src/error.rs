use crate::generation::GenerationError;
use crate::retry::Retryable;
use thiserror::Error;

/// Message shown when the action is triggered on an item without an origin.
pub const NO_ORIGIN_MESSAGE: &str = "This action is only available for items with an origin.";

#[derive(Debug, Error)]
pub enum TranslateError {
    /// The trigger supplied no item to translate.
    #[error("No item was selected for translation")]
    NoItem,

    #[error("{}", NO_ORIGIN_MESSAGE)]
    PreconditionFailed,

    #[error("Field '{field}' has no set named '{variant}'")]
    UnresolvableVariant { field: String, variant: String },

    #[error("No translation provider and model are configured")]
    NotConfigured,

    #[error("Translation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl TranslateError {
    /// True for failures that may succeed when the run is triggered again.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::GenerationFailed(error) => error.is_retryable(),
            _ => false,
        }
    }
}
