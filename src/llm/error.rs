//! Model call error types

use thiserror::Error;

/// Classified failure of a single model round trip.
///
/// The display strings are shown to the user through the session error slot,
/// so they describe what to do next rather than internal details.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP status outside the success range
    #[error("API request failed with status {status}")]
    Transport { status: u16 },

    /// Model stopped at its output token limit before producing text
    #[error(
        "The AI's response was too long and was cut off. Try generating fewer sections at once or simplifying the input."
    )]
    Truncated,

    /// Prompt refused for content-policy reasons
    #[error("AI request was blocked. Reason: {reason}. Try rephrasing your input text.")]
    Blocked { reason: String },

    /// Success status but no text where the response should carry it
    #[error("Invalid response structure from AI. The model may have returned an empty response.")]
    Malformed,

    /// Connection-level failure; no HTTP status was received
    #[error("Request to the AI service failed: {0}")]
    Network(String),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Short machine-friendly name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => "transport",
            ApiError::Truncated => "truncated",
            ApiError::Blocked { .. } => "blocked",
            ApiError::Malformed => "malformed",
            ApiError::Network(_) => "network",
        }
    }
}
