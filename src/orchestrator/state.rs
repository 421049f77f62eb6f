//! WorkflowState - the single aggregate for a proposal drafting session.
//!
//! Every model-backed operation is split in two. `begin_*` validates the
//! phase, clears the error slot and hands out an epoch-stamped [`Ticket`]
//! carrying the call's inputs; `complete_*` applies the call's outcome. A
//! restart bumps the epoch, so completing a ticket issued before it reports
//! [`WorkflowError::Stale`] and changes nothing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::ApiError;
use crate::models::{
    AnalysisResult, Category, Concept, GeneratedSections, OrgDetails, ReviewReport,
    SectionSelection, Selections,
};
use crate::phases::{
    AnalysisOutcome, ConceptOutcome, DraftedSection, PhaseError, SectionProgress,
    collect_sections,
};

/// Current schema version for state snapshots.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Phase
// ============================================================================

/// Workflow phases, in their only forward order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Upload,
    Analyzing,
    ConceptSelection,
    OrgDetails,
    SectionSelection,
    Generating,
    Review,
    Download,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Upload => "upload",
            Phase::Analyzing => "analyzing",
            Phase::ConceptSelection => "concept_selection",
            Phase::OrgDetails => "org_details",
            Phase::SectionSelection => "section_selection",
            Phase::Generating => "generating",
            Phase::Review => "review",
            Phase::Download => "download",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors and tickets
// ============================================================================

/// Rejected or failed workflow operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {action} during the {phase} phase")]
    InvalidTransition { phase: Phase, action: &'static str },
    #[error("'{item}' is not one of the available {category}")]
    UnknownItem { category: Category, item: String },
    #[error("'{0}' is not a required section")]
    UnknownSection(String),
    #[error("concept {index} is out of range ({available} suggested)")]
    ConceptOutOfRange { index: usize, available: usize },
    #[error("Please provide a document to analyze.")]
    EmptyDocument,
    #[error("result discarded because the session was restarted")]
    Stale,
    #[error("{0}")]
    Prompt(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<PhaseError> for WorkflowError {
    fn from(e: PhaseError) -> Self {
        match e {
            PhaseError::Api(api) => WorkflowError::Api(api),
            PhaseError::Prompt(prompt) => WorkflowError::Prompt(prompt.to_string()),
        }
    }
}

/// Proof that an operation began in a given epoch, with its captured inputs
#[derive(Debug, Clone)]
pub struct Ticket<I> {
    epoch: u64,
    input: I,
}

impl<I> Ticket<I> {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn input(&self) -> &I {
        &self.input
    }
}

/// Inputs of a concept suggestion call
#[derive(Debug, Clone)]
pub struct ConceptRequest {
    pub summary: String,
    pub selections: Selections,
}

/// Inputs of the drafting and review calls
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub summary: String,
    pub selections: Selections,
    pub concept: Option<Concept>,
    pub org: OrgDetails,
    /// Selected sections in required order
    pub titles: Vec<String>,
}

/// Drafted sections, the assembled document and its review
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub drafted: Vec<DraftedSection>,
    pub document: String,
    pub review: ReviewReport,
}

/// Inputs of a refinement call
#[derive(Debug, Clone)]
pub struct RefinementRequest {
    pub summary: String,
    pub draft: String,
    pub review: ReviewReport,
    pub notes: String,
}

// ============================================================================
// Workflow State
// ============================================================================

/// Everything a drafting session knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    schema_version: u32,
    phase: Phase,
    /// Bumped by every restart
    epoch: u64,
    document_text: String,
    analysis: AnalysisResult,
    selections: Selections,
    concepts: Vec<Concept>,
    selected_concept: Option<usize>,
    org_details: OrgDetails,
    sections: SectionSelection,
    progress: Option<SectionProgress>,
    generated: GeneratedSections,
    /// Titles whose drafting failed and hold a placeholder
    failed_sections: Vec<String>,
    proposal: String,
    review: ReviewReport,
    refinement_request: String,
    /// Latest user-facing error, cleared when a model-backed operation begins
    last_error: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            phase: Phase::Upload,
            epoch: 0,
            document_text: String::new(),
            analysis: AnalysisResult::default(),
            selections: Selections::default(),
            concepts: Vec::new(),
            selected_concept: None,
            org_details: OrgDetails::default(),
            sections: SectionSelection::default(),
            progress: None,
            generated: GeneratedSections::new(),
            failed_sections: Vec::new(),
            proposal: String::new(),
            review: ReviewReport::default(),
            refinement_request: String::new(),
            last_error: None,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn selected_concept(&self) -> Option<&Concept> {
        self.selected_concept.and_then(|i| self.concepts.get(i))
    }

    pub fn org_details(&self) -> &OrgDetails {
        &self.org_details
    }

    pub fn sections(&self) -> &SectionSelection {
        &self.sections
    }

    pub fn progress(&self) -> Option<&SectionProgress> {
        self.progress.as_ref()
    }

    pub fn generated(&self) -> &GeneratedSections {
        &self.generated
    }

    /// The assembled (or refined) proposal document
    pub fn failed_sections(&self) -> &[String] {
        &self.failed_sections
    }

    pub fn proposal(&self) -> &str {
        &self.proposal
    }

    pub fn review(&self) -> &ReviewReport {
        &self.review
    }

    pub fn refinement_request(&self) -> &str {
        &self.refinement_request
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn require(&self, expected: Phase, action: &'static str) -> Result<(), WorkflowError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn ticket<I>(&self, input: I) -> Ticket<I> {
        Ticket {
            epoch: self.epoch,
            input,
        }
    }

    fn check_ticket<I>(&self, ticket: &Ticket<I>) -> Result<(), WorkflowError> {
        if ticket.epoch == self.epoch {
            Ok(())
        } else {
            debug!(
                ticket_epoch = ticket.epoch,
                epoch = self.epoch,
                "Discarding stale result"
            );
            Err(WorkflowError::Stale)
        }
    }

    /// Put a recoverable error in the slot and hand it back.
    fn report(&mut self, error: WorkflowError) -> WorkflowError {
        warn!(phase = %self.phase, "{}", error);
        self.last_error = Some(error.to_string());
        error
    }

    fn transition(&mut self, to: Phase) {
        info!(from = %self.phase, to = %to, "Phase transition");
        self.phase = to;
    }

    // ------------------------------------------------------------------------
    // Upload -> Analyzing
    // ------------------------------------------------------------------------

    pub fn begin_analysis(&mut self, text: &str) -> Result<Ticket<String>, WorkflowError> {
        self.require(Phase::Upload, "analyze a document")?;
        self.last_error = None;

        let text = text.trim();
        if text.is_empty() {
            return Err(self.report(WorkflowError::EmptyDocument));
        }
        Ok(self.ticket(text.to_string()))
    }

    pub fn complete_analysis(
        &mut self,
        ticket: Ticket<String>,
        outcome: Result<AnalysisOutcome, PhaseError>,
    ) -> Result<(), WorkflowError> {
        self.check_ticket(&ticket)?;
        self.require(Phase::Upload, "apply an analysis")?;

        let outcome = outcome.map_err(|e| self.report(e.into()))?;

        self.document_text = ticket.input;
        self.sections = SectionSelection::all_selected(&outcome.analysis.required_sections);
        self.analysis = outcome.analysis;
        self.selections = Selections::default();
        self.last_error = outcome.warning.map(str::to_string);
        self.transition(Phase::Analyzing);
        Ok(())
    }

    /// Flip one scope, program, or focus area; returns whether it is now selected.
    pub fn toggle_selection(&mut self, category: Category, item: &str) -> Result<bool, WorkflowError> {
        self.require(Phase::Analyzing, "change selections")?;
        self.selections
            .toggle(category, item, self.analysis.items(category))
            .ok_or_else(|| WorkflowError::UnknownItem {
                category,
                item: item.to_string(),
            })
    }

    // ------------------------------------------------------------------------
    // Analyzing -> ConceptSelection
    // ------------------------------------------------------------------------

    pub fn begin_concepts(&mut self) -> Result<Ticket<ConceptRequest>, WorkflowError> {
        self.require(Phase::Analyzing, "suggest concepts")?;
        self.last_error = None;
        Ok(self.ticket(ConceptRequest {
            summary: self.analysis.summary.clone(),
            selections: self.selections.clone(),
        }))
    }

    pub fn complete_concepts(
        &mut self,
        ticket: Ticket<ConceptRequest>,
        outcome: Result<ConceptOutcome, PhaseError>,
    ) -> Result<(), WorkflowError> {
        self.check_ticket(&ticket)?;
        self.require(Phase::Analyzing, "apply concepts")?;

        let outcome = outcome.map_err(|e| self.report(e.into()))?;

        self.selected_concept = (!outcome.concepts.is_empty()).then_some(0);
        self.concepts = outcome.concepts;
        self.last_error = outcome.warning.map(str::to_string);
        self.transition(Phase::ConceptSelection);
        Ok(())
    }

    pub fn select_concept(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.require(Phase::ConceptSelection, "select a concept")?;
        if index >= self.concepts.len() {
            return Err(WorkflowError::ConceptOutOfRange {
                index,
                available: self.concepts.len(),
            });
        }
        self.selected_concept = Some(index);
        Ok(())
    }

    pub fn confirm_concept(&mut self) -> Result<(), WorkflowError> {
        self.require(Phase::ConceptSelection, "confirm a concept")?;
        self.transition(Phase::OrgDetails);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // OrgDetails -> SectionSelection
    // ------------------------------------------------------------------------

    pub fn set_org_details(&mut self, details: OrgDetails) -> Result<(), WorkflowError> {
        self.require(Phase::OrgDetails, "edit organization details")?;
        self.org_details = details;
        Ok(())
    }

    pub fn confirm_org_details(&mut self) -> Result<(), WorkflowError> {
        self.require(Phase::OrgDetails, "confirm organization details")?;
        self.transition(Phase::SectionSelection);
        Ok(())
    }

    /// Flip one required section; returns whether it is now selected.
    pub fn toggle_section(&mut self, title: &str) -> Result<bool, WorkflowError> {
        self.require(Phase::SectionSelection, "change sections")?;
        self.sections
            .toggle(title)
            .ok_or_else(|| WorkflowError::UnknownSection(title.to_string()))
    }

    // ------------------------------------------------------------------------
    // SectionSelection -> Generating -> Review
    // ------------------------------------------------------------------------

    pub fn begin_generation(&mut self) -> Result<Ticket<GenerationRequest>, WorkflowError> {
        self.require(Phase::SectionSelection, "generate the proposal")?;
        self.last_error = None;

        let titles: Vec<String> = self
            .sections
            .selected_in(&self.analysis.required_sections)
            .into_iter()
            .map(str::to_string)
            .collect();

        self.progress = Some(SectionProgress {
            completed: 0,
            total: titles.len(),
            current: titles.first().cloned(),
        });
        self.transition(Phase::Generating);

        Ok(self.ticket(GenerationRequest {
            summary: self.analysis.summary.clone(),
            selections: self.selections.clone(),
            concept: self.selected_concept().cloned(),
            org: self.org_details.clone(),
            titles,
        }))
    }

    /// Mirror loop progress into the state; ignored once the epoch moved on.
    pub fn record_progress(&mut self, epoch: u64, progress: &SectionProgress) {
        if epoch == self.epoch && self.phase == Phase::Generating {
            self.progress = Some(progress.clone());
        }
    }

    pub fn complete_generation(
        &mut self,
        ticket: Ticket<GenerationRequest>,
        outcome: GenerationOutcome,
    ) -> Result<(), WorkflowError> {
        self.check_ticket(&ticket)?;
        self.require(Phase::Generating, "apply drafted sections")?;

        let failures: Vec<&DraftedSection> =
            outcome.drafted.iter().filter(|s| s.failed()).collect();
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                total = outcome.drafted.len(),
                "Some sections used placeholders"
            );
        }
        // The review runs last, so its failure is the latest message
        self.last_error = outcome
            .review
            .error
            .clone()
            .or_else(|| failures.last().and_then(|s| s.error.clone()));
        self.failed_sections = failures.iter().map(|s| s.title.clone()).collect();

        self.generated = collect_sections(&outcome.drafted);
        self.proposal = outcome.document;
        self.review = outcome.review;
        self.progress = Some(SectionProgress {
            completed: outcome.drafted.len(),
            total: outcome.drafted.len(),
            current: None,
        });
        self.transition(Phase::Review);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Review -> Download
    // ------------------------------------------------------------------------

    pub fn set_refinement_request(&mut self, text: &str) -> Result<(), WorkflowError> {
        self.require(Phase::Review, "edit refinement notes")?;
        self.refinement_request = text.to_string();
        Ok(())
    }

    pub fn begin_refinement(&mut self) -> Result<Ticket<RefinementRequest>, WorkflowError> {
        self.require(Phase::Review, "refine the proposal")?;
        self.last_error = None;
        Ok(self.ticket(RefinementRequest {
            summary: self.analysis.summary.clone(),
            draft: self.proposal.clone(),
            review: self.review.clone(),
            notes: self.refinement_request.clone(),
        }))
    }

    pub fn complete_refinement(
        &mut self,
        ticket: Ticket<RefinementRequest>,
        outcome: Result<String, PhaseError>,
    ) -> Result<(), WorkflowError> {
        self.check_ticket(&ticket)?;
        self.require(Phase::Review, "apply a refinement")?;

        let refined = outcome.map_err(|e| self.report(e.into()))?;

        self.proposal = refined;
        self.refinement_request.clear();
        self.transition(Phase::Download);
        Ok(())
    }

    /// Accept the draft as is.
    pub fn finish(&mut self) -> Result<(), WorkflowError> {
        self.require(Phase::Review, "finish")?;
        self.transition(Phase::Download);
        Ok(())
    }

    /// Back to a fresh session. Results of calls still in flight become stale.
    pub fn restart(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        info!(from = %self.phase, epoch, "Restarting session");
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Snapshot file name for the current phase
    pub fn snapshot_file_name(&self) -> String {
        format!("state-{}.json", self.phase)
    }

    /// Parse a snapshot written from [`WorkflowState`]'s serialized form.
    pub fn from_snapshot(json: &str) -> Result<Self> {
        let state: Self = serde_json::from_str(json).context("Failed to parse state snapshot")?;
        if state.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported state schema version {} (expected {})",
                state.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(state)
    }
}
