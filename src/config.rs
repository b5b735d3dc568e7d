//! Configuration management for interactive-llm.
//!
//! The configuration file lists the available models, each with the options
//! used to build its provider client, plus defaults for the interfaces.

use crate::core::error::LlmError;
use crate::core::llm::{LlmApi, PROVIDER_KEY, ProviderOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used when none is selected
    #[serde(default)]
    pub default_model: String,

    /// System prompt used when none is given
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Available models and their provider options
    #[serde(default)]
    pub llms: Vec<ModelConfig>,

    /// Web interface configuration
    #[serde(default)]
    pub web: WebInterfaceConfig,

    /// Conversation export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Where the web UI persists its settings
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
}

/// One selectable model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,

    /// Provider tag plus provider specific options
    #[serde(default)]
    pub options: ProviderOptions,
}

/// Web interface configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebInterfaceConfig {
    /// Interface bind host
    #[serde(default = "default_web_host")]
    pub host: String,

    /// Interface bind port
    #[serde(default = "default_web_port")]
    pub port: u16,

    /// Maximum accepted payload size in bytes
    #[serde(default = "default_web_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for WebInterfaceConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            max_payload_bytes: default_web_max_payload_bytes(),
        }
    }
}

/// Conversation export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Directory receiving exported conversations
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
        }
    }
}

pub fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

pub fn default_settings_file() -> PathBuf {
    PathBuf::from("settings.json")
}

pub fn default_export_directory() -> PathBuf {
    PathBuf::from("conversations")
}

pub fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_web_port() -> u16 {
    8080
}

pub fn default_web_max_payload_bytes() -> usize {
    1024 * 1024
}

impl AppConfig {
    /// Create a new configuration from a file path (auto-detect format by extension)
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to parse JSON config file '{}': {}",
                    path.display(),
                    e
                )
            })?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to parse YAML config file '{}': {}",
                    path.display(),
                    e
                )
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to parse TOML config file '{}': {}",
                    path.display(),
                    e
                )
            })?,
            Some(ext) => {
                return Err(anyhow::anyhow!(
                    "Unsupported config format: {} (file: {})",
                    ext,
                    path.display()
                ));
            }
            None => {
                return Err(anyhow::anyhow!(
                    "Config file has no extension, cannot determine format: {}",
                    path.display()
                ));
            }
        };

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llms.is_empty() {
            return Err(anyhow::anyhow!("No models configured under 'llms'"));
        }

        let mut seen = HashSet::new();
        for llm in &self.llms {
            if llm.model_name.trim().is_empty() {
                return Err(anyhow::anyhow!("Model name cannot be empty"));
            }
            if !seen.insert(llm.model_name.as_str()) {
                return Err(anyhow::anyhow!(
                    "Model '{}' is configured more than once",
                    llm.model_name
                ));
            }
            if let Some(provider) = llm.options.get(PROVIDER_KEY)
                && !provider.is_string()
            {
                return Err(anyhow::anyhow!(
                    "Provider of model '{}' must be a string",
                    llm.model_name
                ));
            }
        }

        if !seen.contains(self.default_model.as_str()) {
            return Err(anyhow::anyhow!(
                "Default model '{}' not found in config file",
                self.default_model
            ));
        }

        if self.web.port == 0 {
            return Err(anyhow::anyhow!("Web interface port must be greater than 0"));
        }
        if self.web.max_payload_bytes == 0 {
            return Err(anyhow::anyhow!(
                "Web interface max_payload_bytes must be greater than 0"
            ));
        }

        Ok(())
    }

    pub fn model_names(&self) -> Vec<String> {
        self.llms.iter().map(|llm| llm.model_name.clone()).collect()
    }

    /// Options of the named model, including its `provider` tag.
    pub fn model_options(&self, model_name: &str) -> Result<ProviderOptions, LlmError> {
        self.llms
            .iter()
            .find(|llm| llm.model_name == model_name)
            .map(|llm| llm.options.clone())
            .ok_or_else(|| {
                LlmError::configuration(format!("Model '{}' not found in config file", model_name))
            })
    }

    /// Build the client for the named model.
    pub fn client_for(&self, model_name: &str) -> Result<LlmApi, LlmError> {
        LlmApi::new(self.model_options(model_name)?)
    }
}
