use serde::{Deserialize, Serialize};

/// Report text stored when the review call fails
pub const FALLBACK_REVIEW: &str = "Could not generate a final review.";

/// Results from the review phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub text: String,
    /// True when `text` is [`FALLBACK_REVIEW`] rather than model output
    #[serde(default)]
    pub fallback: bool,
    /// Why the review call failed, when it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewReport {
    pub fn generated(text: String) -> Self {
        Self {
            text,
            fallback: false,
            error: None,
        }
    }

    /// Fallback report carrying the failure message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: FALLBACK_REVIEW.to_string(),
            fallback: true,
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
