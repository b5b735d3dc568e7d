mod common;

use httpmock::prelude::*;
use interactive_llm::core::conversation::DirectoryStore;
use interactive_llm::core::interface::Interface;
use interactive_llm::interfaces::terminal::TerminalInterface;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

fn terminal(
    config: interactive_llm::config::AppConfig,
    model: Option<&str>,
    input: &str,
    dir: &TempDir,
) -> TerminalInterface<Cursor<Vec<u8>>, Vec<u8>> {
    TerminalInterface::new(
        Arc::new(config),
        model.map(str::to_string),
        Box::new(DirectoryStore::new(dir.path().join("conversations"))),
        Cursor::new(input.as_bytes().to_vec()),
        Vec::new(),
    )
}

fn output(interface: &TerminalInterface<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(interface.output().clone()).unwrap()
}

#[tokio::test]
async fn test_empty_model_selects_default_and_chats() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(json!({ "model": "gpt-4o" }).to_string());
            then.status(200)
                .header("content-type", "application/json")
                .json_body(common::openai_completion("Hello from the model"));
        })
        .await;
    let config = common::test_config(&server.base_url(), dir.path());

    let mut interface = terminal(config, None, "\nHi there\nEXIT\nignored\n", &dir);
    interface.init().await.unwrap();
    interface.run().await.unwrap();

    mock.assert_hits_async(1).await;
    let printed = output(&interface);
    assert!(printed.contains("You entered model: gpt-4o"));
    assert!(printed.contains("Response: Hello from the model"));
    assert!(printed.contains("prompt_tokens=12"));
    assert_eq!(interface.session().unwrap().conversation().len(), 1);
}

#[tokio::test]
async fn test_errors_are_printed_and_loop_continues() {
    let dir = TempDir::new().unwrap();
    let config = common::test_config(&common::closed_port_url(), dir.path());

    let mut interface = terminal(config, Some("gpt-4o"), "first\nsecond\nexit\n", &dir);
    interface.init().await.unwrap();
    interface.run().await.unwrap();

    let printed = output(&interface);
    assert_eq!(printed.matches("Error: OpenAI API error").count(), 2);
}

#[tokio::test]
async fn test_unknown_model_fails_init() {
    let dir = TempDir::new().unwrap();
    let config = common::test_config("http://127.0.0.1:9", dir.path());

    let mut interface = terminal(config, Some("gpt-2"), "", &dir);
    let err = interface.init().await.unwrap_err();

    assert!(err.to_string().contains("Model 'gpt-2' not found"));
}

#[tokio::test]
async fn test_image_command_attaches_to_next_prompt() {
    let dir = TempDir::new().unwrap();
    let image = common::write_png(dir.path(), "pixel.png");
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("data:image/png;base64,");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(common::openai_completion("A pixel"));
        })
        .await;
    let config = common::test_config(&server.base_url(), dir.path());

    let input = format!("/image {}\nWhat is this?\nexit\n", image.display());
    let mut interface = terminal(config, Some("gpt-4o"), &input, &dir);
    interface.init().await.unwrap();
    interface.run().await.unwrap();

    mock.assert_async().await;
    let printed = output(&interface);
    assert!(printed.contains("Attached image:"));
    assert!(printed.contains("Response: A pixel"));
}

#[tokio::test]
async fn test_export_command_writes_conversation() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(common::openai_completion("Noted"));
        })
        .await;
    let config = common::test_config(&server.base_url(), dir.path());

    let mut interface = terminal(config, Some("gpt-4o"), "remember this\n/export\n", &dir);
    interface.init().await.unwrap();
    interface.run().await.unwrap();

    assert!(output(&interface).contains("Conversation exported to gpt-4o_"));
    let exported: Vec<_> = std::fs::read_dir(dir.path().join("conversations"))
        .unwrap()
        .collect();
    assert_eq!(exported.len(), 1);
}
