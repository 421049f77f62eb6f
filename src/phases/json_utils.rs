//! JSON extraction utilities for parsing LLM responses.
//!
//! Model output is prose-wrapped more often than not: introductory sentences,
//! ```json fences, trailing commas. Extraction takes the widest bracketed span
//! of the requested kind, repairs trailing commas, and parses that.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// A comma followed only by whitespace and a closing bracket
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("invalid TRAILING_COMMA regex"));

/// Why no JSON value could be pulled out of a response
#[derive(Debug, Error)]
pub enum JsonExtractionError {
    #[error("no {0} found in response")]
    NoStructure(&'static str),
    #[error("failed to parse extracted JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Extract the span from the first `open` to the last `close` in `text`.
///
/// Surrounding prose and code fences fall outside the span.
pub fn extract_json_block(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Remove every comma that directly precedes a closing `}` or `]`.
pub fn strip_trailing_commas(json: &str) -> String {
    TRAILING_COMMA.replace_all(json, "$1").into_owned()
}

/// Extract and parse the outermost JSON object in `raw`.
pub fn try_extract_json_object(raw: &str) -> Result<Value, JsonExtractionError> {
    try_extract(raw, '{', '}', "JSON object").and_then(|value| {
        if value.is_object() {
            Ok(value)
        } else {
            Err(JsonExtractionError::NoStructure("JSON object"))
        }
    })
}

/// Extract and parse the outermost JSON array in `raw`.
pub fn try_extract_json_array(raw: &str) -> Result<Value, JsonExtractionError> {
    try_extract(raw, '[', ']', "JSON array").and_then(|value| {
        if value.is_array() {
            Ok(value)
        } else {
            Err(JsonExtractionError::NoStructure("JSON array"))
        }
    })
}

/// [`try_extract_json_object`] with the error discarded; callers pick the fallback.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    try_extract_json_object(raw).ok()
}

/// [`try_extract_json_array`] with the error discarded; callers pick the fallback.
pub fn extract_json_array(raw: &str) -> Option<Value> {
    try_extract_json_array(raw).ok()
}

fn try_extract(
    raw: &str,
    open: char,
    close: char,
    what: &'static str,
) -> Result<Value, JsonExtractionError> {
    let block = extract_json_block(raw, open, close).ok_or(JsonExtractionError::NoStructure(what))?;
    let repaired = strip_trailing_commas(block);
    Ok(serde_json::from_str(&repaired)?)
}
