//! services/api/src/pipeline/envelope.rs
//!
//! Parser for the JSON envelopes the text model is asked to return.
//!
//! Grammar: `[prose] [fence-open] json-object [fence-close] [prose]` where a fence
//! is three backticks with an optional language tag. When a fenced block is
//! present only its contents are parsed; otherwise the whole reply must be JSON.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Why a model reply could not be turned into the expected field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("model reply was empty")]
    Empty,
    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("model reply is JSON but not an object")]
    NotAnObject,
    #[error("field `{0}` is missing")]
    MissingField(String),
    #[error("field `{0}` is not a non-empty string")]
    NotAString(String),
}

/// Strips an optional markdown code fence and returns the JSON text inside.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parses the reply as a JSON object and returns the named string field.
pub fn extract_field(reply: &str, field: &str) -> Result<String, EnvelopeError> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err(EnvelopeError::Empty);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(EnvelopeError::NotAnObject)?;
    let raw = object
        .get(field)
        .ok_or_else(|| EnvelopeError::MissingField(field.to_string()))?;

    match raw.as_str().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(EnvelopeError::NotAString(field.to_string())),
    }
}

/// A story split into its title line and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryText {
    pub title: String,
    pub body: String,
}

/// Splits `story_text` into title (first non-empty line) and body (the rest).
///
/// Markdown heading marks and the Japanese title brackets 「」『』 around the
/// title are removed. Returns `None` when either part would be empty.
pub fn split_title(story_text: &str) -> Option<StoryText> {
    let text = story_text.trim_start();
    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (text, ""),
    };

    let title = first
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_start_matches(['「', '『'])
        .trim_end_matches(['」', '』'])
        .trim()
        .to_string();
    let body = rest.trim().to_string();

    if title.is_empty() || body.is_empty() {
        return None;
    }
    Some(StoryText { title, body })
}
