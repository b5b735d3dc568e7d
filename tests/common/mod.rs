//! Shared helpers for integration tests.
#![allow(dead_code)]

use interactive_llm::config::AppConfig;
use serde_json::json;
use std::path::{Path, PathBuf};

/// A tiny but valid 1x1 PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, PNG_BYTES).unwrap();
    path
}

/// Configuration with one OpenAI and one Bedrock model, both pointed at `base_url`.
pub fn test_config(base_url: &str, dir: &Path) -> AppConfig {
    serde_json::from_value(json!({
        "default_model": "gpt-4o",
        "system_prompt": "You are a helpful assistant.",
        "llms": [
            {
                "model_name": "gpt-4o",
                "options": {
                    "provider": "OpenAI",
                    "api_key": "test-key",
                    "base_url": format!("{}/v1", base_url)
                }
            },
            {
                "model_name": "amazon.nova-lite-v1",
                "options": {
                    "provider": "Bedrock",
                    "api_key": "bedrock-key",
                    "endpoint_url": base_url
                }
            }
        ],
        "settings_file": dir.join("settings.json"),
        "export": { "directory": dir.join("conversations") }
    }))
    .unwrap()
}

pub fn openai_completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 12,
            "completion_tokens": 7,
            "total_tokens": 19
        }
    })
}

/// An address nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
