//! Error types for the interactive-llm core.
//!
//! Each failure class gets one variant so callers can branch on the class
//! without knowing which provider is active.

use crate::core::llm::ProviderKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Unknown model, unsupported provider tag or unusable provider options.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    /// Anything that went wrong talking to the provider.
    #[error("{provider} API error: {message}")]
    ProviderApi {
        provider: ProviderKind,
        message: String,
    },
}

impl LlmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provider_api(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::ProviderApi {
            provider,
            message: message.into(),
        }
    }
}

/// Failures while turning prompt fragments into messages.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    #[error("Unsupported prompt fragment tag '{tag}'")]
    UnsupportedFragment { tag: String },

    #[error("Malformed prompt fragment: {0}")]
    MalformedFragment(String),

    #[error("Image file not found: {}", path.display())]
    ImageNotFound { path: PathBuf },

    #[error("Failed to read image file '{}': {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image data URI: {0}")]
    InvalidDataUri(String),
}

/// Failures persisting settings or exporting conversations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize stored data: {0}")]
    Serialize(#[from] serde_json::Error),
}
