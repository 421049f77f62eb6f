mod analyzer;
mod concepts;
mod json_utils;
mod prompts;
mod reviewer;
mod sections;

pub use analyzer::*;
pub use concepts::*;
pub use json_utils::{
    JsonExtractionError, extract_json_array, extract_json_block, extract_json_object,
    strip_trailing_commas, try_extract_json_array, try_extract_json_object,
};
pub use prompts::{PromptBuilder, PromptError, SectionContext, SectionKind};
pub use reviewer::*;
pub use sections::*;

use thiserror::Error;

use crate::llm::ApiError;

/// Failure of a single model-backed phase call
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl PhaseError {
    /// The API failure, if the call got as far as the model
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            PhaseError::Api(e) => Some(e),
            PhaseError::Prompt(_) => None,
        }
    }
}
