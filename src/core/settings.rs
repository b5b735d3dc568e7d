//! Persisted UI settings: the last selected model and system prompt.

use crate::core::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub model: String,
    pub system_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: default_settings_model(),
            system_prompt: default_settings_system_prompt(),
        }
    }
}

pub fn default_settings_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub fn default_settings_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

pub struct SettingsManager;

impl SettingsManager {
    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Settings, StoreError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if json.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(path: &Path, settings: &Settings) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}
