//! Generative model access.
//!
//! Phases talk to the model through [`ModelClient`]; the production
//! implementation is [`GeminiClient`], and [`LoggingClient`] wraps any client
//! with per-call tracing.

mod error;
mod gemini;

pub use error::ApiError;
pub use gemini::{GeminiClient, classify_response};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

/// One request/response round trip to the generative API.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single-turn prompt and return the model's text.
    async fn send(&self, prompt: &str) -> Result<String, ApiError>;

    /// Model identifier for logging
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Arc<T> {
    async fn send(&self, prompt: &str) -> Result<String, ApiError> {
        (**self).send(prompt).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for model clients
pub struct LoggingClient<C> {
    inner: C,
}

impl<C: ModelClient> LoggingClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for LoggingClient<C> {
    async fn send(&self, prompt: &str) -> Result<String, ApiError> {
        let start = Instant::now();
        let result = self.inner.send(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                info!(
                    model = %self.inner.model_id(),
                    duration_ms = %duration.as_millis(),
                    prompt_chars = prompt.len(),
                    response_chars = text.len(),
                    "Model request completed"
                );
            }
            Err(e) => {
                warn!(
                    model = %self.inner.model_id(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind(),
                    error = %e,
                    "Model request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
