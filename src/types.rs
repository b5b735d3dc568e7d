use crate::core::error::PreprocessingError;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One unit of user-supplied content.
///
/// On the wire a fragment is an object with exactly one key, `{"text": ".."}`
/// or `{"image": "path/to/file.png"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "Value")]
pub enum PromptFragment {
    Text(String),
    Image(PathBuf),
}

impl PromptFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::Image(path.into())
    }
}

impl TryFrom<Value> for PromptFragment {
    type Error = PreprocessingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(PreprocessingError::MalformedFragment(format!(
                    "expected an object with a single key, got {}",
                    other
                )));
            }
        };

        if map.len() != 1 {
            return Err(PreprocessingError::MalformedFragment(format!(
                "expected exactly one key per fragment, got {}",
                map.len()
            )));
        }

        let Some((tag, value)) = map.into_iter().next() else {
            return Err(PreprocessingError::MalformedFragment(
                "empty fragment".to_string(),
            ));
        };

        let as_string = |value: Value| match value {
            Value::String(s) => Ok(s),
            other => Err(PreprocessingError::MalformedFragment(format!(
                "value of '{}' must be a string, got {}",
                tag, other
            ))),
        };

        match tag.as_str() {
            "text" => Ok(Self::Text(as_string(value)?)),
            "image" => Ok(Self::Image(PathBuf::from(as_string(value)?))),
            _ => Err(PreprocessingError::UnsupportedFragment { tag: tag.clone() }),
        }
    }
}

/// What the user asked: a bare string or an ordered list of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "Value")]
pub enum UserPrompt {
    Text(String),
    Fragments(Vec<PromptFragment>),
}

impl UserPrompt {
    /// The prompt as fragments; a bare string becomes one text fragment.
    pub fn fragments(&self) -> Vec<PromptFragment> {
        match self {
            UserPrompt::Text(text) => vec![PromptFragment::Text(text.clone())],
            UserPrompt::Fragments(fragments) => fragments.clone(),
        }
    }

    /// Text portion of the prompt, used when recording conversation turns.
    pub fn display_text(&self) -> String {
        match self {
            UserPrompt::Text(text) => text.clone(),
            UserPrompt::Fragments(fragments) => fragments
                .iter()
                .map(|fragment| match fragment {
                    PromptFragment::Text(text) => text.clone(),
                    PromptFragment::Image(path) => format!("[image: {}]", path.display()),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl TryFrom<Value> for UserPrompt {
    type Error = PreprocessingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .map(PromptFragment::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Fragments),
            // A lone fragment object is accepted as a one-element list.
            Value::Object(_) => Ok(Self::Fragments(vec![PromptFragment::try_from(value)?])),
            other => Err(PreprocessingError::MalformedFragment(format!(
                "prompt must be a string or a list of fragments, got {}",
                other
            ))),
        }
    }
}

impl From<&str> for UserPrompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for UserPrompt {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<PromptFragment>> for UserPrompt {
    fn from(fragments: Vec<PromptFragment>) -> Self {
        Self::Fragments(fragments)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part message, in the chat-completions shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Provider-neutral chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn system(text: &str) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::text(text)],
        }
    }

    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    /// Concatenated text parts, ignoring images.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Token accounting returned by whichever provider answered.
///
/// Keys are passed through as the provider named them. Nested objects are
/// flattened with `.`, so `prompt_tokens_details.cached_tokens` survives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usage(BTreeMap<String, Number>);

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let mut usage = Self::new();
        usage.flatten_into("", value);
        usage
    }

    fn flatten_into(&mut self, prefix: &str, value: &Value) {
        match value {
            Value::Number(n) if !prefix.is_empty() => {
                self.0.insert(prefix.to_string(), n.clone());
            }
            Value::Object(map) => {
                for (key, value) in map {
                    let key = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    self.flatten_into(&key, value);
                }
            }
            _ => {}
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.0.insert(key.into(), Number::from(value));
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Number::as_u64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Number)> {
        self.0.iter()
    }

    pub fn input_tokens(&self) -> Option<u64> {
        self.get("prompt_tokens").or_else(|| self.get("inputTokens"))
    }

    pub fn output_tokens(&self) -> Option<u64> {
        self.get("completion_tokens")
            .or_else(|| self.get("outputTokens"))
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.get("total_tokens").or_else(|| self.get("totalTokens"))
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", rendered)
    }
}
