//! Converts user prompt fragments into the provider-neutral message pair.

use crate::core::error::PreprocessingError;
use crate::types::{ChatMessage, ContentPart, PromptFragment, UserPrompt};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Build `[system, user]` messages for one call.
///
/// Every image is read and inlined before anything is returned, so a bad
/// fragment never yields a partial message list.
pub fn create_messages(
    prompts: &UserPrompt,
    system_prompt: &str,
) -> Result<[ChatMessage; 2], PreprocessingError> {
    let fragments = prompts.fragments();
    let mut parts = Vec::with_capacity(fragments.len());

    for fragment in &fragments {
        let part = match fragment {
            PromptFragment::Text(text) => ContentPart::text(text.as_str()),
            PromptFragment::Image(path) => ContentPart::image_url(image_data_uri(path)?),
        };
        parts.push(part);
    }

    debug!(
        "Built user message with {} part(s) from {} fragment(s)",
        parts.len(),
        fragments.len()
    );

    Ok([ChatMessage::system(system_prompt), ChatMessage::user(parts)])
}

/// Read an image and encode it as a `data:image/png;base64,` URI.
pub fn image_data_uri(path: &Path) -> Result<String, PreprocessingError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => PreprocessingError::ImageNotFound {
            path: path.to_path_buf(),
        },
        _ => PreprocessingError::ImageRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    debug!("Encoding {} byte image from {}", bytes.len(), path.display());
    Ok(format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(bytes)))
}

/// Split a base64 data URI into its image format (`png`, `jpeg`, ...) and payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, String), PreprocessingError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PreprocessingError::InvalidDataUri("missing 'data:' scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PreprocessingError::InvalidDataUri("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PreprocessingError::InvalidDataUri("payload is not base64".to_string()))?;
    let format = mime
        .strip_prefix("image/")
        .ok_or_else(|| PreprocessingError::InvalidDataUri(format!("not an image: {}", mime)))?;

    Ok((format.to_string(), payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_data_uri_splits_format_and_payload() {
        let (format, payload) = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(format, "png");
        assert_eq!(payload, "aGVsbG8=");
    }

    #[test]
    fn decode_data_uri_rejects_non_base64() {
        assert!(matches!(
            decode_data_uri("data:image/png,raw"),
            Err(PreprocessingError::InvalidDataUri(_))
        ));
        assert!(decode_data_uri("https://example.com/cat.png").is_err());
    }

    #[test]
    fn system_prompt_becomes_single_text_part() {
        let [system, _] = create_messages(&UserPrompt::from("hi"), "be brief").unwrap();
        assert_eq!(system.content, vec![ContentPart::text("be brief")]);
    }
}
