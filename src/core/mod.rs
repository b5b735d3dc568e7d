//! Core services for interactive-llm.
//!
//! This module contains the provider client and message preprocessing, plus the
//! small persistence helpers the interfaces share.

pub mod conversation;
pub mod error;
pub mod interface;
pub mod llm;
pub mod preprocessing;
pub mod session;
pub mod settings;
