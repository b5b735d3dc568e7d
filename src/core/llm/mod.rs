//! Provider client: one `LlmApi` bound to exactly one backend.

pub mod bedrock;
pub mod client;
pub mod openai;

use crate::core::error::LlmError;
use crate::core::preprocessing::create_messages;
use crate::types::{ChatMessage, Usage, UserPrompt};
use async_trait::async_trait;
use bedrock::{BedrockClient, BedrockOptions};
use client::ChatProvider;
use openai::{OpenAiClient, OpenAiOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Generic per-model options as they appear in the configuration file.
pub type ProviderOptions = serde_json::Map<String, Value>;

/// Key naming the provider inside [`ProviderOptions`].
pub const PROVIDER_KEY: &str = "provider";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "OpenAI")]
    OpenAi,
    Bedrock,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "OpenAI"),
            ProviderKind::Bedrock => write!(f, "Bedrock"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "bedrock" => Ok(ProviderKind::Bedrock),
            _ => Err(LlmError::configuration(format!(
                "Unsupported LLM provider: {}",
                s
            ))),
        }
    }
}

/// The backend an [`LlmApi`] is bound to.
#[derive(Debug)]
pub enum ProviderClient {
    OpenAi(OpenAiClient),
    Bedrock(BedrockClient),
}

#[async_trait]
impl ChatProvider for ProviderClient {
    fn kind(&self) -> ProviderKind {
        match self {
            ProviderClient::OpenAi(c) => c.kind(),
            ProviderClient::Bedrock(c) => c.kind(),
        }
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<(String, Usage), LlmError> {
        match self {
            ProviderClient::OpenAi(c) => c.complete(model, messages).await,
            ProviderClient::Bedrock(c) => c.complete(model, messages).await,
        }
    }
}

/// Entry point for talking to a model.
#[derive(Debug)]
pub struct LlmApi {
    client: ProviderClient,
}

impl LlmApi {
    /// Bind a client from generic options.
    ///
    /// The `provider` key is removed before the rest is handed to the
    /// provider; it defaults to OpenAI when absent.
    pub fn new(mut options: ProviderOptions) -> Result<Self, LlmError> {
        let kind = match options.remove(PROVIDER_KEY) {
            None => ProviderKind::default(),
            Some(Value::String(tag)) => tag.parse()?,
            Some(other) => {
                return Err(LlmError::configuration(format!(
                    "Provider tag must be a string, got {}",
                    other
                )));
            }
        };

        let client = match kind {
            ProviderKind::OpenAi => ProviderClient::OpenAi(OpenAiClient::new(
                parse_options::<OpenAiOptions>(kind, options)?,
            )?),
            ProviderKind::Bedrock => ProviderClient::Bedrock(BedrockClient::new(
                parse_options::<BedrockOptions>(kind, options)?,
            )?),
        };

        info!("Initialized {} client", kind);
        Ok(Self { client })
    }

    pub fn from_client(client: ProviderClient) -> Self {
        Self { client }
    }

    pub fn provider(&self) -> ProviderKind {
        self.client.kind()
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    /// Send one prompt and return the response text with usage counters.
    pub async fn call(
        &self,
        prompts: &UserPrompt,
        system_prompt: &str,
        model_name: &str,
    ) -> Result<(String, Usage), LlmError> {
        let messages = create_messages(prompts, system_prompt)?;
        self.client.complete(model_name, &messages).await
    }
}

fn parse_options<T: serde::de::DeserializeOwned>(
    kind: ProviderKind,
    options: ProviderOptions,
) -> Result<T, LlmError> {
    serde_json::from_value(Value::Object(options))
        .map_err(|e| LlmError::configuration(format!("Invalid {} options: {}", kind, e)))
}
