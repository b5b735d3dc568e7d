//! Interface implementations for interactive-llm.
//!
//! This module contains implementations of the `core::interface::Interface` trait
//! for the terminal prompt and the web chat UI.

pub mod terminal;
pub mod web;
