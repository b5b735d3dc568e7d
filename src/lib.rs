//! interactive-llm library crate.
//!
//! This crate exposes the main modules for testing purposes.

pub mod cli;
pub mod config;
pub mod core;
pub mod interfaces;
pub mod types;

// Re-export main items for easier access
pub use config::AppConfig;
pub use crate::core::error::{LlmError, PreprocessingError};
pub use crate::core::llm::{LlmApi, ProviderKind};
pub use crate::core::preprocessing::create_messages;
