//! Conversation log and export.
//!
//! Turns are only ever appended. An export is written as one timestamped JSON
//! object per call to [`ConversationStore::put`].

use crate::core::error::StoreError;
use crate::types::Usage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub response: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    pub model_name: String,
    pub system_prompt: String,
    pub conversation: Conversation,
}

/// Destination for exported conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Write the export and return the key it was stored under.
    async fn put(&self, export: &ConversationExport) -> Result<String, StoreError>;
}

/// Stores each export as `<root>/<model>_<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ConversationStore for DirectoryStore {
    async fn put(&self, export: &ConversationExport) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;

        let key = export_key(&export.model_name, Utc::now());
        let path = self.root.join(&key);
        let json = serde_json::to_string_pretty(export)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        info!(
            "Exported {} turn(s) to {}",
            export.conversation.len(),
            path.display()
        );
        Ok(key)
    }
}

/// Object key for an export. Characters unsafe in file names become `-`.
pub fn export_key(model_name: &str, at: DateTime<Utc>) -> String {
    let model: String = model_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{}_{}.json", model, at.format("%Y%m%dT%H%M%S%3fZ"))
}
