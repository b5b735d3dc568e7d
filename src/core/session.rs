//! Chat session shared by the front-ends.
//!
//! Binds a model, its client and a system prompt, and records every completed
//! turn. Each call still sends only the current user prompt.

use crate::config::AppConfig;
use crate::core::conversation::{Conversation, ConversationExport, ConversationTurn};
use crate::core::error::LlmError;
use crate::core::llm::LlmApi;
use crate::types::{Usage, UserPrompt};
use tracing::info;

#[derive(Debug)]
pub struct ChatSession {
    model_name: String,
    system_prompt: String,
    api: LlmApi,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(config: &AppConfig, model_name: &str, system_prompt: &str) -> Result<Self, LlmError> {
        let api = config.client_for(model_name)?;
        Ok(Self::with_client(api, model_name, system_prompt))
    }

    pub fn with_client(api: LlmApi, model_name: &str, system_prompt: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            system_prompt: system_prompt.to_string(),
            api,
            conversation: Conversation::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn api(&self) -> &LlmApi {
        &self.api
    }

    /// Rebind to another configured model. The conversation is kept.
    pub fn switch_model(&mut self, config: &AppConfig, model_name: &str) -> Result<(), LlmError> {
        if model_name == self.model_name {
            return Ok(());
        }
        self.api = config.client_for(model_name)?;
        info!("Switched model from {} to {}", self.model_name, model_name);
        self.model_name = model_name.to_string();
        Ok(())
    }

    pub fn set_system_prompt(&mut self, system_prompt: &str) {
        self.system_prompt = system_prompt.to_string();
    }

    /// Send one prompt; on success the turn is appended to the conversation.
    pub async fn send(&mut self, prompt: &UserPrompt) -> Result<(String, Usage), LlmError> {
        let (response, usage) = self
            .api
            .call(prompt, &self.system_prompt, &self.model_name)
            .await?;

        self.conversation.push(ConversationTurn {
            user_input: prompt.display_text(),
            response: response.clone(),
            usage: usage.clone(),
        });
        Ok((response, usage))
    }

    pub fn export(&self) -> ConversationExport {
        ConversationExport {
            model_name: self.model_name.clone(),
            system_prompt: self.system_prompt.clone(),
            conversation: self.conversation.clone(),
        }
    }
}
