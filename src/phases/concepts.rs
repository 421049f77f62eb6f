use tracing::{info, warn};

use crate::llm::ModelClient;
use crate::models::{Concept, Selections};

use super::{JsonExtractionError, PhaseError, PromptBuilder, try_extract_json_array};

/// Slot message when the concept response is not a JSON array
pub const INVALID_CONCEPTS: &str = "AI returned invalid concept format.";

/// Concepts offered to the user, plus any degradation notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptOutcome {
    pub concepts: Vec<Concept>,
    pub warning: Option<&'static str>,
}

/// Decode at most three well-formed concepts from a response.
pub fn parse_concepts(raw: &str) -> Result<Vec<Concept>, JsonExtractionError> {
    let value = try_extract_json_array(raw)?;
    Ok(Concept::list_from_json(&value))
}

/// Decode a response; an unparseable one, or an array with no usable
/// concept in it, yields no concepts and a warning.
pub fn interpret_concepts(raw: &str) -> ConceptOutcome {
    let value = match try_extract_json_array(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Concept response was not a JSON array: {}", e);
            return ConceptOutcome::invalid();
        }
    };

    let concepts = Concept::list_from_json(&value);
    let offered = value.as_array().map_or(0, Vec::len);
    if concepts.is_empty() && offered > 0 {
        warn!(offered, "Concept response held no named concepts");
        return ConceptOutcome::invalid();
    }

    ConceptOutcome {
        concepts,
        warning: None,
    }
}

impl ConceptOutcome {
    fn invalid() -> Self {
        Self {
            concepts: Vec::new(),
            warning: Some(INVALID_CONCEPTS),
        }
    }
}

/// Ask the model for project concepts matching the current selections.
pub async fn run_concepts<C: ModelClient + ?Sized>(
    client: &C,
    prompts: &PromptBuilder,
    summary: &str,
    selections: &Selections,
) -> Result<ConceptOutcome, PhaseError> {
    let prompt = prompts.concepts(summary, selections)?;
    let raw = client.send(&prompt).await?;
    let outcome = interpret_concepts(&raw);

    info!(concepts = outcome.concepts.len(), "Concept suggestion complete");
    Ok(outcome)
}
