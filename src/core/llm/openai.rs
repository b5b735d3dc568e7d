use crate::{
    core::error::LlmError,
    core::llm::ProviderKind,
    core::llm::client::{ChatProvider, error_message, http_client},
    types::{ChatMessage, Usage},
};
use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Options accepted for an OpenAI model entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiOptions {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub organization: Option<String>,

    #[serde(default)]
    pub project: Option<String>,
}

pub fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    organization: Option<String>,
    project: Option<String>,
}

impl OpenAiClient {
    pub fn new(options: OpenAiOptions) -> Result<Self, LlmError> {
        let api_key = match options.api_key {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV).map_err(|_| {
                LlmError::configuration(format!(
                    "OpenAI api_key is not set in options or {}",
                    API_KEY_ENV
                ))
            })?,
        };
        let base_url = options.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client: http_client(&base_url)?,
            api_key,
            base_url,
            organization: options.organization,
            project: options.project,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, model: &str, messages: &[ChatMessage]) -> anyhow::Result<(String, Usage)> {
        let url = format!("{}/chat/completions", self.base_url);
        info!("Sending chat completion to {} (model: {})", url, model);

        let payload = json!({
            "model": model,
            "messages": messages,
        });

        let mut request = self.client.post(&url).bearer_auth(&self.api_key).json(&payload);
        if let Some(organization) = &self.organization {
            request = request.header("OpenAI-Organization", organization);
        }
        if let Some(project) = &self.project {
            request = request.header("OpenAI-Project", project);
        }

        let response = request.send().await.context("request failed")?;
        let status = response.status();
        info!("Received HTTP response with status: {}", status);

        let body = response
            .text()
            .await
            .context("failed to read response body")?;
        if !status.is_success() {
            bail!("HTTP {}: {}", status, error_message(&body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .with_context(|| format!("failed to decode response JSON: {}", body))?;
        debug!("Completion returned {} choice(s)", parsed.choices.len());

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no choices returned"))?;
        // Refusals and tool-call-only choices carry no text.
        let text = choice
            .message
            .content
            .ok_or_else(|| anyhow!("first choice has no text content"))?;

        Ok((text, Usage::from_value(&parsed.usage)))
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<(String, Usage), LlmError> {
        self.send(model, messages).await.map_err(|e| {
            error!("OpenAI call for model '{}' failed: {:#}", model, e);
            LlmError::provider_api(self.kind(), format!("{:#}", e))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Value,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
