//! Line based terminal interface.
//!
//! Commands:
//! * `exit` quits (any case)
//! * `/image <path>` attaches an image to the next prompt
//! * `/export` writes the conversation to the configured store
//!
//! Anything else is sent to the model.

use crate::config::AppConfig;
use crate::core::conversation::ConversationStore;
use crate::core::interface::Interface;
use crate::core::session::ChatSession;
use crate::types::{PromptFragment, UserPrompt};
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

pub struct TerminalInterface<R, W> {
    config: Arc<AppConfig>,
    model: Option<String>,
    session: Option<ChatSession>,
    store: Box<dyn ConversationStore>,
    pending_images: Vec<PathBuf>,
    input: R,
    output: W,
}

impl<R, W> TerminalInterface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        config: Arc<AppConfig>,
        model: Option<String>,
        store: Box<dyn ConversationStore>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            config,
            model,
            session: None,
            store,
            pending_images: Vec::new(),
            input,
            output,
        }
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn writeln(&mut self, text: &str) -> Result<()> {
        self.write(&format!("{}\n", text)).await
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.write(label).await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Handle one input line. Returns `true` when the user asked to quit.
    pub async fn handle_line(&mut self, line: &str) -> Result<bool> {
        if line.eq_ignore_ascii_case("exit") {
            return Ok(true);
        }
        if line.is_empty() {
            return Ok(false);
        }

        if let Some(path) = line.strip_prefix("/image")
            && (path.is_empty() || path.starts_with(char::is_whitespace))
        {
            let path = path.trim();
            if path.is_empty() {
                self.writeln("Usage: /image <path>").await?;
            } else {
                self.pending_images.push(PathBuf::from(path));
                self.writeln(&format!("Attached image: {}", path)).await?;
            }
            return Ok(false);
        }

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("terminal interface used before init"))?;

        let reply = if line == "/export" {
            match self.store.put(&session.export()).await {
                Ok(key) => format!("Conversation exported to {}", key),
                Err(e) => {
                    error!("Export failed: {}", e);
                    format!("Error: {}", e)
                }
            }
        } else {
            let mut fragments = vec![PromptFragment::text(line)];
            fragments.extend(self.pending_images.drain(..).map(PromptFragment::Image));

            match session.send(&UserPrompt::Fragments(fragments)).await {
                Ok((response, usage)) => format!("Response: {}\nUsage: {}", response, usage),
                Err(e) => {
                    error!("Call failed: {}", e);
                    format!("Error: {}", e)
                }
            }
        };
        self.writeln(&reply).await?;
        Ok(false)
    }
}

#[async_trait::async_trait]
impl<R, W> Interface for TerminalInterface<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn init(&mut self) -> Result<()> {
        let model = match self.model.take() {
            Some(model) => model,
            None => self.prompt("Enter model: ").await?.unwrap_or_default(),
        };
        let model = if model.is_empty() {
            self.config.default_model.clone()
        } else {
            model
        };
        self.writeln(&format!("You entered model: {}", model)).await?;

        let session = ChatSession::new(&self.config, &model, &self.config.system_prompt)?;
        info!("Terminal session using {} via {}", model, session.api().provider());
        self.session = Some(session);
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        while let Some(line) = self.prompt("Enter command: ").await? {
            if self.handle_line(&line).await? {
                break;
            }
        }
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.output.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}
