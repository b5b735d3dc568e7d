use crate::{
    core::error::LlmError,
    core::llm::ProviderKind,
    core::llm::client::{ChatProvider, error_message, http_client},
    core::preprocessing::decode_data_uri,
    types::{ChatMessage, ContentPart, Role, Usage},
};
use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Sampling parameters sent with every Converse request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all(serialize = "camelCase"))]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.5,
            top_p: 0.9,
        }
    }
}

/// Options accepted for a Bedrock model entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockOptions {
    #[serde(default = "default_region")]
    pub region: String,

    /// Bedrock API key, sent as a bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub inference_config: InferenceConfig,
}

pub fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: Client,
    region: String,
    endpoint: String,
    api_key: Option<String>,
    inference_config: InferenceConfig,
}

impl BedrockClient {
    pub fn new(options: BedrockOptions) -> Result<Self, LlmError> {
        let endpoint = options
            .endpoint_url
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", options.region));
        Url::parse(&endpoint).map_err(|e| {
            LlmError::configuration(format!("Invalid Bedrock endpoint '{}': {}", endpoint, e))
        })?;

        let api_key = options.api_key.or_else(|| std::env::var(API_KEY_ENV).ok());
        if api_key.is_none() {
            warn!(
                "No Bedrock api_key configured and {} is unset; requests will be unauthenticated",
                API_KEY_ENV
            );
        }

        Ok(Self {
            client: http_client(&endpoint)?,
            region: options.region,
            endpoint,
            api_key,
            inference_config: options.inference_config,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn inference_config(&self) -> InferenceConfig {
        self.inference_config
    }

    fn converse_url(&self, model: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("endpoint cannot be a base URL: {}", self.endpoint))?
            .pop_if_empty()
            .extend(["model", model, "converse"]);
        Ok(url)
    }

    async fn send(&self, model: &str, messages: &[ChatMessage]) -> anyhow::Result<(String, Usage)> {
        let url = self.converse_url(model)?;
        info!("Sending Converse request to {} (region: {})", url, self.region);

        let body = converse_request(messages, self.inference_config)?;

        let mut request = self.client.post(url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.context("request failed")?;
        let status = response.status();
        info!("Received HTTP response with status: {}", status);

        let text = response
            .text()
            .await
            .context("failed to read response body")?;
        if !status.is_success() {
            bail!("HTTP {}: {}", status, error_message(&text));
        }

        let parsed: ConverseResponse = serde_json::from_str(&text)
            .with_context(|| format!("failed to decode response JSON: {}", text))?;
        debug!("Converse stop reason: {:?}", parsed.stop_reason);

        let response_text = parsed
            .output
            .message
            .and_then(|message| message.content.into_iter().next())
            .ok_or_else(|| anyhow!("response contained no content blocks"))?
            .text
            .ok_or_else(|| anyhow!("first content block has no text"))?;

        Ok((response_text, Usage::from_value(&parsed.usage)))
    }
}

#[async_trait]
impl ChatProvider for BedrockClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bedrock
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<(String, Usage), LlmError> {
        self.send(model, messages).await.map_err(|e| {
            error!("Bedrock call for model '{}' failed: {:#}", model, e);
            LlmError::provider_api(self.kind(), format!("{:#}", e))
        })
    }
}

/// Translate neutral messages into a Converse request body.
pub fn converse_request(
    messages: &[ChatMessage],
    inference_config: InferenceConfig,
) -> anyhow::Result<Value> {
    let mut system = Vec::new();
    let mut conversation = Vec::new();

    for message in messages {
        match message.role {
            Role::System => {
                // Converse rejects blank text blocks.
                let text = message.text();
                if !text.is_empty() {
                    system.push(json!({ "text": text }));
                }
            }
            Role::User | Role::Assistant => {
                let content = message
                    .content
                    .iter()
                    .map(content_block)
                    .collect::<anyhow::Result<Vec<_>>>()?;
                conversation.push(json!({
                    "role": message.role,
                    "content": content,
                }));
            }
        }
    }

    Ok(json!({
        "system": system,
        "messages": conversation,
        "inferenceConfig": inference_config,
    }))
}

fn content_block(part: &ContentPart) -> anyhow::Result<Value> {
    match part {
        ContentPart::Text { text } => Ok(json!({ "text": text })),
        ContentPart::ImageUrl { image_url } => {
            let (format, bytes) = decode_data_uri(&image_url.url)?;
            Ok(json!({
                "image": {
                    "format": format,
                    "source": { "bytes": bytes },
                }
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Value,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    #[serde(default)]
    message: Option<ConverseMessage>,
}

#[derive(Debug, Deserialize)]
struct ConverseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_config_serializes_camel_case() {
        let value = serde_json::to_value(InferenceConfig::default()).unwrap();
        assert_eq!(value["maxTokens"], 512);
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["topP"], 0.9);
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let messages = [
            ChatMessage::system(""),
            ChatMessage::user(vec![ContentPart::text("hi")]),
        ];
        let body = converse_request(&messages, InferenceConfig::default()).unwrap();
        assert_eq!(body["system"], json!([]));
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn converse_url_keeps_model_id_in_path() {
        let client = BedrockClient::new(BedrockOptions {
            region: "eu-west-1".to_string(),
            api_key: Some("key".to_string()),
            endpoint_url: None,
            inference_config: InferenceConfig::default(),
        })
        .unwrap();

        let url = client.converse_url("amazon.nova-lite-v1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bedrock-runtime.eu-west-1.amazonaws.com/model/amazon.nova-lite-v1/converse"
        );
    }
}
