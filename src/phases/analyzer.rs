use tracing::{debug, info, warn};

use crate::llm::ModelClient;
use crate::models::AnalysisResult;

use super::{JsonExtractionError, PhaseError, PromptBuilder, try_extract_json_object};

/// Slot message when the analysis response carried no usable JSON object
pub const UNSTRUCTURED_ANALYSIS: &str =
    "AI analysis could not be structured. Proceeding with summary only.";

/// Analysis applied to the session, plus any degradation notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub analysis: AnalysisResult,
    pub warning: Option<&'static str>,
}

/// Strictly decode an analysis response.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, JsonExtractionError> {
    let value = try_extract_json_object(raw)?;
    // try_extract_json_object only returns objects
    let object = value
        .as_object()
        .ok_or(JsonExtractionError::NoStructure("JSON object"))?;
    Ok(AnalysisResult::from_json_object(object))
}

/// Decode a response, degrading to a summary-only analysis when it has no JSON.
pub fn interpret_analysis(raw: &str) -> AnalysisOutcome {
    match parse_analysis(raw) {
        Ok(analysis) => AnalysisOutcome {
            analysis,
            warning: None,
        },
        Err(e) => {
            warn!("Analysis response was not structured: {}", e);
            AnalysisOutcome {
                analysis: AnalysisResult::from_raw_summary(raw),
                warning: Some(UNSTRUCTURED_ANALYSIS),
            }
        }
    }
}

/// Run the analysis phase over an ingested announcement.
pub async fn run_analysis<C: ModelClient + ?Sized>(
    client: &C,
    prompts: &PromptBuilder,
    document: &str,
) -> Result<AnalysisOutcome, PhaseError> {
    let prompt = prompts.analysis(document)?;
    debug!(prompt_chars = prompt.len(), "Requesting announcement analysis");

    let raw = client.send(&prompt).await?;
    let outcome = interpret_analysis(&raw);

    info!(
        scopes = outcome.analysis.scopes.len(),
        programs = outcome.analysis.programs.len(),
        focus_areas = outcome.analysis.focus_areas.len(),
        sections = outcome.analysis.required_sections.len(),
        structured = outcome.warning.is_none(),
        "Analysis complete"
    );

    Ok(outcome)
}
