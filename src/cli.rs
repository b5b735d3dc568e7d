use crate::config::AppConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "interactive-llm", about = "Chat with OpenAI or Bedrock models")]
pub struct Args {
    /// Configuration file (.yml, .yaml, .json or .toml)
    #[arg(long, default_value = "config.yml")]
    pub config: PathBuf,

    /// Model to use; the terminal asks when omitted
    #[arg(long)]
    pub model: Option<String>,

    /// Overrides the configured system prompt
    #[arg(long)]
    pub system_prompt: Option<String>,

    #[arg(long, value_enum, default_value = "terminal")]
    pub interface: InterfaceType,

    /// Web interface bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Web interface bind port
    #[arg(long)]
    pub port: Option<u16>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceType {
    Terminal,
    Web,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(system_prompt) = &self.system_prompt {
            config.system_prompt = system_prompt.clone();
        }
        if let Some(host) = &self.host {
            config.web.host = host.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
    }
}
