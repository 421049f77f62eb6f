//! Workflow - drives a [`WorkflowState`] against a model client.
//!
//! Each method is `begin_*`, the phase call, then `complete_*`. Callers that
//! need to restart while a call is in flight use those three steps directly.

use tracing::info;

use crate::llm::ModelClient;
use crate::models::{Category, OrgDetails, SECTION_SEPARATOR};
use crate::phases::{
    PromptBuilder, ReviewRefinementCycle, SectionContext, SectionGenerationLoop, SectionProgress,
    run_analysis, run_concepts,
};

use super::state::{GenerationOutcome, GenerationRequest, WorkflowError, WorkflowState};

/// Draft every requested section in order, assemble them, and review the result.
pub async fn draft_and_review<C: ModelClient + ?Sized>(
    client: &C,
    prompts: &PromptBuilder,
    request: &GenerationRequest,
    on_progress: impl FnMut(&SectionProgress),
) -> GenerationOutcome {
    let ctx = SectionContext {
        summary: &request.summary,
        selections: &request.selections,
        concept: request.concept.as_ref(),
        org: &request.org,
    };

    let drafted = SectionGenerationLoop::new(client, prompts, request.titles.iter().cloned())
        .run(&ctx, on_progress)
        .await;

    // Titles are already filtered and ordered, so every drafted block is kept
    let document = drafted
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    let review = ReviewRefinementCycle::new(client, prompts)
        .review(&request.summary, &document)
        .await;

    GenerationOutcome {
        drafted,
        document,
        review,
    }
}

/// A drafting session bound to a client and a prompt builder
pub struct Workflow<C> {
    client: C,
    prompts: PromptBuilder,
    state: WorkflowState,
}

impl<C: ModelClient> Workflow<C> {
    pub fn new(client: C, prompts: PromptBuilder) -> Self {
        Self {
            client,
            prompts,
            state: WorkflowState::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Mutable access for the split `begin_*`/`complete_*` protocol
    pub fn state_mut(&mut self) -> &mut WorkflowState {
        &mut self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub async fn analyze(&mut self, text: &str) -> Result<(), WorkflowError> {
        let ticket = self.state.begin_analysis(text)?;
        let outcome = run_analysis(&self.client, &self.prompts, ticket.input()).await;
        self.state.complete_analysis(ticket, outcome)
    }

    pub fn toggle_selection(&mut self, category: Category, item: &str) -> Result<bool, WorkflowError> {
        self.state.toggle_selection(category, item)
    }

    pub async fn suggest_concepts(&mut self) -> Result<(), WorkflowError> {
        let ticket = self.state.begin_concepts()?;
        let request = ticket.input();
        let outcome =
            run_concepts(&self.client, &self.prompts, &request.summary, &request.selections).await;
        self.state.complete_concepts(ticket, outcome)
    }

    pub fn select_concept(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.state.select_concept(index)
    }

    pub fn confirm_concept(&mut self) -> Result<(), WorkflowError> {
        self.state.confirm_concept()
    }

    pub fn set_org_details(&mut self, details: OrgDetails) -> Result<(), WorkflowError> {
        self.state.set_org_details(details)
    }

    pub fn confirm_org_details(&mut self) -> Result<(), WorkflowError> {
        self.state.confirm_org_details()
    }

    pub fn toggle_section(&mut self, title: &str) -> Result<bool, WorkflowError> {
        self.state.toggle_section(title)
    }

    /// Draft the selected sections, then review the assembled document.
    ///
    /// Individual section failures become placeholders; this only fails when
    /// called in the wrong phase or after a restart.
    pub async fn generate(
        &mut self,
        mut on_progress: impl FnMut(&SectionProgress),
    ) -> Result<(), WorkflowError> {
        let ticket = self.state.begin_generation()?;
        let epoch = ticket.epoch();

        let state = &mut self.state;
        let outcome = draft_and_review(&self.client, &self.prompts, ticket.input(), |p| {
            state.record_progress(epoch, p);
            on_progress(p);
        })
        .await;

        info!(
            sections = outcome.drafted.len(),
            failed = outcome.drafted.iter().filter(|s| s.failed()).count(),
            document_chars = outcome.document.len(),
            "Generation complete"
        );
        self.state.complete_generation(ticket, outcome)
    }

    pub fn set_refinement_request(&mut self, text: &str) -> Result<(), WorkflowError> {
        self.state.set_refinement_request(text)
    }

    /// Replace the draft with a refined one; on failure the draft is untouched.
    pub async fn refine(&mut self) -> Result<(), WorkflowError> {
        let ticket = self.state.begin_refinement()?;
        let request = ticket.input();
        let outcome = ReviewRefinementCycle::new(&self.client, &self.prompts)
            .refine(&request.summary, &request.draft, &request.review, &request.notes)
            .await;
        self.state.complete_refinement(ticket, outcome)
    }

    pub fn finish(&mut self) -> Result<(), WorkflowError> {
        self.state.finish()
    }

    pub fn restart(&mut self) {
        self.state.restart();
    }

}
