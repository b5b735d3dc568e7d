use interactive_llm::config::{
    AppConfig, default_export_directory, default_settings_file, default_system_prompt,
    default_web_host, default_web_max_payload_bytes, default_web_port,
};
use interactive_llm::core::error::LlmError;
use interactive_llm::core::llm::ProviderKind;
use std::path::PathBuf;
use tempfile::TempDir;

const YAML_CONFIG: &str = r#"---
default_model: gpt-4o
system_prompt: "You are a Rust programming expert."
llms:
  - model_name: gpt-4o
    options:
      provider: OpenAI
      api_key: sk-test
  - model_name: anthropic.claude-3-haiku-20240307-v1:0
    options:
      provider: Bedrock
      region: eu-central-1
      api_key: bedrock-test
      inference_config:
        max_tokens: 1024
        temperature: 0.2
web:
  port: 9000
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_config_from_yaml() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(write(&dir, "config.yml", YAML_CONFIG)).unwrap();

    assert_eq!(config.default_model, "gpt-4o");
    assert_eq!(config.system_prompt, "You are a Rust programming expert.");
    assert_eq!(
        config.model_names(),
        vec!["gpt-4o", "anthropic.claude-3-haiku-20240307-v1:0"]
    );
    assert_eq!(config.web.port, 9000);
    assert_eq!(config.web.host, default_web_host());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_json() {
    let dir = TempDir::new().unwrap();
    let json = r#"{
        "default_model": "gpt-4o-mini",
        "llms": [
            { "model_name": "gpt-4o-mini", "options": { "provider": "OpenAI", "api_key": "k" } }
        ]
    }"#;

    let config = AppConfig::from_file(write(&dir, "config.json", json)).unwrap();

    assert_eq!(config.default_model, "gpt-4o-mini");
    assert_eq!(config.system_prompt, default_system_prompt());
    assert_eq!(config.settings_file, default_settings_file());
    assert_eq!(config.export.directory, default_export_directory());
    assert_eq!(config.web.max_payload_bytes, default_web_max_payload_bytes());
}

#[test]
fn test_config_from_toml() {
    let dir = TempDir::new().unwrap();
    let toml = r#"
default_model = "amazon.nova-lite-v1"

[[llms]]
model_name = "amazon.nova-lite-v1"

[llms.options]
provider = "Bedrock"
region = "us-west-2"
api_key = "k"

[export]
directory = "exports"
"#;

    let config = AppConfig::from_file(write(&dir, "config.toml", toml)).unwrap();

    assert_eq!(config.export.directory, PathBuf::from("exports"));
    assert_eq!(config.web.port, default_web_port());
    let api = config.client_for("amazon.nova-lite-v1").unwrap();
    assert_eq!(api.provider(), ProviderKind::Bedrock);
}

#[test]
fn test_config_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::from_file(write(&dir, "config.ini", "x=1")).unwrap_err();
    assert!(err.to_string().contains("Unsupported config format"));

    let err = AppConfig::from_file(write(&dir, "config", "x=1")).unwrap_err();
    assert!(err.to_string().contains("no extension"));
}

#[test]
fn test_config_missing_file() {
    let err = AppConfig::from_file("/definitely/not/here.yml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_model_options_keeps_provider_tag() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(write(&dir, "config.yml", YAML_CONFIG)).unwrap();

    let options = config
        .model_options("anthropic.claude-3-haiku-20240307-v1:0")
        .unwrap();
    assert_eq!(options["provider"], "Bedrock");
    assert_eq!(options["region"], "eu-central-1");

    let api = config
        .client_for("anthropic.claude-3-haiku-20240307-v1:0")
        .unwrap();
    assert_eq!(api.provider(), ProviderKind::Bedrock);
}

#[test]
fn test_unknown_model_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::from_file(write(&dir, "config.yml", YAML_CONFIG)).unwrap();

    let err = config.model_options("gpt-2").unwrap_err();
    assert!(matches!(err, LlmError::Configuration(message) if message.contains("gpt-2")));
    assert!(matches!(
        config.client_for("gpt-2"),
        Err(LlmError::Configuration(_))
    ));
}

#[test]
fn test_validate_rejects_bad_configs() {
    let dir = TempDir::new().unwrap();
    let base = AppConfig::from_file(write(&dir, "config.yml", YAML_CONFIG)).unwrap();

    let mut config = base.clone();
    config.default_model = "missing".to_string();
    assert!(
        config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Default model 'missing' not found")
    );

    let mut config = base.clone();
    config.llms.push(config.llms[0].clone());
    assert!(config.validate().unwrap_err().to_string().contains("more than once"));

    let mut config = base.clone();
    config.llms.clear();
    assert!(config.validate().is_err());

    let mut config = base.clone();
    config.web.port = 0;
    assert!(config.validate().is_err());

    let mut config = base;
    config.llms[0]
        .options
        .insert("provider".to_string(), serde_json::json!(1));
    assert!(config.validate().is_err());
}
