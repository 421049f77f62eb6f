use tracing::{info, warn};

use crate::llm::ModelClient;
use crate::models::ReviewReport;

use super::{PhaseError, PromptBuilder};

/// Final review of an assembled draft and optional user-driven refinement
pub struct ReviewRefinementCycle<'a, C: ?Sized> {
    client: &'a C,
    prompts: &'a PromptBuilder,
}

impl<'a, C: ModelClient + ?Sized> ReviewRefinementCycle<'a, C> {
    pub fn new(client: &'a C, prompts: &'a PromptBuilder) -> Self {
        Self { client, prompts }
    }

    /// Review the draft. Never fails: any error yields the fallback report.
    pub async fn review(&self, summary: &str, document: &str) -> ReviewReport {
        match self.try_review(summary, document).await {
            Ok(text) => {
                info!(review_chars = text.len(), "Review complete");
                ReviewReport::generated(text)
            }
            Err(e) => {
                warn!("Review failed, using fallback report: {}", e);
                ReviewReport::failed(format!("Error generating review: {}", e))
            }
        }
    }

    async fn try_review(&self, summary: &str, document: &str) -> Result<String, PhaseError> {
        let prompt = self.prompts.review(summary, document)?;
        Ok(self.client.send(&prompt).await?)
    }

    /// Produce a complete replacement document.
    ///
    /// On error the caller keeps its current draft.
    pub async fn refine(
        &self,
        summary: &str,
        draft: &str,
        review: &ReviewReport,
        notes: &str,
    ) -> Result<String, PhaseError> {
        let prompt = self.prompts.refinement(summary, draft, &review.text, notes)?;
        let refined = self.client.send(&prompt).await?;
        info!(
            draft_chars = draft.len(),
            refined_chars = refined.len(),
            "Refinement complete"
        );
        Ok(refined)
    }
}
