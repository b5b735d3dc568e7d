use crate::core::error::LlmError;
use crate::core::llm::ProviderKind;
use crate::types::{ChatMessage, Usage};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt::Debug;

/// Trait implemented by each provider backend.
///
/// Implementations receive the already preprocessed `[system, user]` pair and
/// perform exactly one request. Every failure is reported as
/// [`LlmError::ProviderApi`] tagged with [`ChatProvider::kind`].
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    /// The provider this client talks to.
    fn kind(&self) -> ProviderKind;

    /// Send one chat request.
    ///
    /// # Arguments
    /// * `model` - Provider model identifier (e.g. "gpt-4o")
    /// * `messages` - System message followed by the user message
    ///
    /// # Returns
    /// * The first response text and the provider's usage counters
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<(String, Usage), LlmError>;
}

/// Build the HTTP client for an endpoint. Loopback endpoints bypass proxies.
pub fn http_client(endpoint: &str) -> Result<Client, LlmError> {
    let is_loopback = Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| host == "localhost" || host == "127.0.0.1" || host == "[::1]");

    let builder = if is_loopback {
        Client::builder().no_proxy()
    } else {
        Client::builder()
    };

    builder.build().map_err(|e| {
        LlmError::configuration(format!("Failed to build HTTP client for {}: {}", endpoint, e))
    })
}

/// Best-effort extraction of a human readable message from an error body.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    json["error"]["message"]
        .as_str()
        .or_else(|| json["message"].as_str())
        .or_else(|| json["Message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::{error_message, http_client};

    #[test]
    fn http_client_builds_for_remote_and_loopback_endpoints() {
        assert!(http_client("https://api.openai.com/v1").is_ok());
        assert!(http_client("http://127.0.0.1:8080").is_ok());
        assert!(http_client("not a url").is_ok());
    }

    #[test]
    fn error_message_reads_openai_and_bedrock_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Rate limit reached"}}"#),
            "Rate limit reached"
        );
        assert_eq!(
            error_message(r#"{"message":"The security token included in the request is invalid."}"#),
            "The security token included in the request is invalid."
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
