//! Response Extractor
//!
//! Isolates the JSON object embedded in a raw model reply. Reasoning text,
//! Markdown fences and surrounding prose are expected noise, not errors.
//!
//! Steps, each applied to the previous output:
//! 1. Drop everything up to and including the last `</think>` marker.
//! 2. Trim surrounding whitespace.
//! 3. If the text opens with a ``` fence, drop the opening fence line
//!    (with its optional language tag) and everything from the last ```.
//! 4. Slice from the first `{` to the last `}` when both exist in order.
//!    Otherwise the trimmed text is returned unchanged.

use thiserror::Error;

/// Marker closing a model's reasoning section
pub const REASONING_CLOSE_MARKER: &str = "</think>";

const FENCE: &str = "```";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// Nothing is left once reasoning and fences are removed.
    #[error("Model reply is empty after removing reasoning and fences")]
    Empty,
}

/// Return the span of `raw` most likely to hold the action JSON object.
pub fn extract_json(raw: &str) -> Result<&str, ExtractError> {
    let text = strip_reasoning(raw).trim();
    let text = strip_fences(text);

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(slice_object(text))
}

fn strip_reasoning(text: &str) -> &str {
    match text.rfind(REASONING_CLOSE_MARKER) {
        Some(idx) => &text[idx + REASONING_CLOSE_MARKER.len()..],
        None => text,
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    // language tag runs up to the first newline
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };

    match body.rfind(FENCE) {
        Some(idx) => &body[..idx],
        None => body,
    }
}

fn slice_object(text: &str) -> &str {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return &text[start..=end];
        }
    }
    text.trim()
}
