//! Integration tests for the drafting workflow.
//!
//! These tests drive full sessions against a stub model client:
//! - End-to-end assembly and section ordering
//! - Partial failure containment
//! - Review and refinement degradation
//! - Restart and stale-result handling

use std::sync::Mutex;

use async_trait::async_trait;

use grant_forge::llm::{ApiError, ModelClient};
use grant_forge::models::{Category, FALLBACK_REVIEW, OrgDetails};
use grant_forge::orchestrator::{Phase, Workflow, WorkflowError, WorkflowState, draft_and_review};
use grant_forge::phases::{INVALID_CONCEPTS, PromptBuilder, UNSTRUCTURED_ANALYSIS, run_analysis};

// ============================================================================
// Stub client
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Analysis,
    Concepts,
    Section,
    Review,
    Refinement,
}

fn prompt_kind(prompt: &str) -> PromptKind {
    if prompt.starts_with("Analyze the following grant funding announcement") {
        PromptKind::Analysis
    } else if prompt.contains("suggest 3 distinct project concepts") {
        PromptKind::Concepts
    } else if prompt.starts_with("Act as a meticulous grant reviewer") {
        PromptKind::Review
    } else if prompt.contains("A draft proposal has been generated") {
        PromptKind::Refinement
    } else {
        PromptKind::Section
    }
}

/// Title embedded in a section prompt's task clause
fn section_title(prompt: &str) -> &str {
    let start = prompt.find("titled \"").map(|i| i + "titled \"".len()).unwrap_or(0);
    let rest = &prompt[start..];
    &rest[..rest.find('"').unwrap_or(rest.len())]
}

type Responder = Box<dyn Fn(PromptKind, &str) -> Result<String, ApiError> + Send + Sync>;

/// Answers each prompt through a routing closure and records every prompt.
struct StubClient {
    respond: Responder,
    prompts: Mutex<Vec<(PromptKind, String)>>,
}

impl StubClient {
    fn new(respond: impl Fn(PromptKind, &str) -> Result<String, ApiError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self, kind: PromptKind) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl ModelClient for StubClient {
    async fn send(&self, prompt: &str) -> Result<String, ApiError> {
        let kind = prompt_kind(prompt);
        self.prompts.lock().unwrap().push((kind, prompt.to_string()));
        (self.respond)(kind, prompt)
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

const TWO_SECTION_ANALYSIS: &str = r#"{"summary":"S","scopes":[],"programs":[],"focusAreas":[],"requiredSections":["Intro","Budget"]}"#;

const CONCEPTS: &str = r#"[{"name":"Mobile Pantry","description":"Food on wheels."},{"name":"Garden","description":"Grow food."}]"#;

fn analysis_with(sections: &[&str]) -> String {
    serde_json::json!({
        "summary": "Funder wants measurable impact.",
        "scopes": [{"name": "Housing", "description": "Shelter"}, {"name": "Health", "description": "Clinics"}],
        "programs": [],
        "focusAreas": [{"name": "Rural", "description": "Rural counties"}],
        "requiredSections": sections,
    })
    .to_string()
}

/// Stub answering every phase successfully; sections echo their title marker
fn echo_client(analysis: String) -> StubClient {
    StubClient::new(move |kind, prompt| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        PromptKind::Section => Ok(format!("SECTION:{}", section_title(prompt))),
        PromptKind::Review => Ok("Strengths: clear need.".to_string()),
        PromptKind::Refinement => Ok("## Intro\n\nRefined".to_string()),
    })
}

fn workflow(client: StubClient) -> Workflow<StubClient> {
    Workflow::new(client, PromptBuilder::bundled().unwrap())
}

/// Drive a session up to SectionSelection.
async fn to_section_selection(workflow: &mut Workflow<StubClient>) {
    workflow.analyze("Announcement text").await.unwrap();
    workflow.suggest_concepts().await.unwrap();
    workflow.confirm_concept().unwrap();
    workflow
        .set_org_details(OrgDetails {
            name: "Helping Hands".to_string(),
            mission: "Feed families".to_string(),
            past_experience: "Ten years".to_string(),
            max_budget: "50000".to_string(),
            time_frame: "12".to_string(),
        })
        .unwrap();
    workflow.confirm_org_details().unwrap();
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_two_section_session_assembles_exact_document() {
    let client = StubClient::new(|kind, _| match kind {
        PromptKind::Analysis => Ok(TWO_SECTION_ANALYSIS.to_string()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        _ => Ok("OK".to_string()),
    });
    let mut workflow = workflow(client);

    workflow.analyze("Announcement text").await.unwrap();
    let sections: Vec<_> = workflow
        .state()
        .sections()
        .entries()
        .iter()
        .map(|e| (e.title.as_str(), e.selected))
        .collect();
    assert_eq!(sections, vec![("Intro", true), ("Budget", true)]);

    workflow.suggest_concepts().await.unwrap();
    assert_eq!(workflow.state().phase(), Phase::ConceptSelection);
    workflow.confirm_concept().unwrap();
    workflow.confirm_org_details().unwrap();

    let mut updates = Vec::new();
    workflow.generate(|p| updates.push(p.clone())).await.unwrap();

    let state = workflow.state();
    assert_eq!(state.phase(), Phase::Review);
    assert_eq!(state.proposal(), "## Intro\n\nOK\n\n\n## Budget\n\nOK");
    assert_eq!(state.review().text, "OK");
    assert_eq!(state.last_error(), None);
    assert_eq!(updates.len(), 3);
    assert_eq!(state.progress().unwrap().completed, 2);

    workflow.finish().unwrap();
    assert_eq!(workflow.state().phase(), Phase::Download);
}

#[tokio::test]
async fn test_section_order_follows_required_sections() {
    let titles = ["Executive Summary", "Need", "Budget Narrative", "Evaluation Plan"];
    let mut workflow = workflow(echo_client(analysis_with(&titles)));
    to_section_selection(&mut workflow).await;

    // Churn the selection order; drafting order must not change
    for title in ["Evaluation Plan", "Executive Summary", "Executive Summary", "Evaluation Plan"] {
        workflow.toggle_section(title).unwrap();
    }
    workflow.generate(|_| {}).await.unwrap();

    let document = workflow.state().proposal().to_string();
    let mut last = 0;
    for title in titles {
        let marker = format!("SECTION:{}", title);
        assert_eq!(document.matches(&marker).count(), 1, "{}", marker);
        let position = document.find(&marker).unwrap();
        assert!(position >= last, "{} out of order", title);
        last = position;
    }
    assert_eq!(document.split("\n\n\n").count(), titles.len());
}

#[tokio::test]
async fn test_selections_and_concept_reach_section_prompts() {
    let mut workflow = workflow(echo_client(analysis_with(&["Need"])));
    workflow.analyze("Announcement text").await.unwrap();
    assert_eq!(workflow.toggle_selection(Category::Scopes, "Health"), Ok(true));
    assert_eq!(workflow.toggle_selection(Category::FocusAreas, "Rural"), Ok(true));
    assert!(matches!(
        workflow.toggle_selection(Category::Programs, "Health"),
        Err(WorkflowError::UnknownItem { .. })
    ));

    workflow.suggest_concepts().await.unwrap();
    workflow.select_concept(1).unwrap();
    workflow.confirm_concept().unwrap();
    workflow.confirm_org_details().unwrap();
    workflow.generate(|_| {}).await.unwrap();

    let prompts = workflow.client().prompts.lock().unwrap();
    let (_, section_prompt) = prompts
        .iter()
        .find(|(k, _)| *k == PromptKind::Section)
        .unwrap();
    assert!(section_prompt.contains("Selected Scopes of Service: Health"));
    assert!(section_prompt.contains("Selected Focus Areas: Rural"));
    assert!(section_prompt.contains("Selected Project Concept: Garden"));
}

// ============================================================================
// Failure containment
// ============================================================================

#[tokio::test]
async fn test_single_section_failure_is_contained() {
    let analysis = analysis_with(&["Intro", "Need", "Budget"]);
    let client = StubClient::new(move |kind, prompt| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        PromptKind::Section if section_title(prompt) == "Need" => {
            Err(ApiError::Transport { status: 503 })
        }
        PromptKind::Section => Ok(format!("SECTION:{}", section_title(prompt))),
        PromptKind::Review => Ok("Review".to_string()),
        PromptKind::Refinement => Ok(String::new()),
    });
    let mut workflow = workflow(client);
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();

    let state = workflow.state();
    assert_eq!(state.phase(), Phase::Review);
    let blocks: Vec<&str> = state.proposal().split("\n\n\n").collect();
    assert_eq!(
        blocks,
        vec![
            "## Intro\n\nSECTION:Intro",
            "## Need\n\nCould not generate the 'Need' section.",
            "## Budget\n\nSECTION:Budget",
        ]
    );
    assert!(state.last_error().unwrap().contains("Need"));
    assert_eq!(state.failed_sections(), ["Need".to_string()]);
    assert_eq!(workflow.client().calls(PromptKind::Review), 1);
}

#[tokio::test]
async fn test_review_failure_uses_fallback() {
    let analysis = analysis_with(&["Intro"]);
    let client = StubClient::new(move |kind, _| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        PromptKind::Review => Err(ApiError::Truncated),
        _ => Ok("OK".to_string()),
    });
    let mut workflow = workflow(client);
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();

    let state = workflow.state();
    assert_eq!(state.phase(), Phase::Review);
    assert_eq!(state.review().text, FALLBACK_REVIEW);
    assert!(state.review().fallback);
    assert_eq!(state.proposal(), "## Intro\n\nOK");
    assert!(state.failed_sections().is_empty());
    let message = state.last_error().unwrap();
    assert!(message.starts_with("Error generating review"), "{message}");
}

#[tokio::test]
async fn test_review_transport_failure_reported_after_clean_drafting() {
    let analysis = analysis_with(&["Intro", "Budget"]);
    let client = StubClient::new(move |kind, _| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        PromptKind::Review => Err(ApiError::Transport { status: 503 }),
        _ => Ok("OK".to_string()),
    });
    let mut workflow = workflow(client);
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();

    let state = workflow.state();
    assert_eq!(state.proposal(), "## Intro\n\nOK\n\n\n## Budget\n\nOK");
    assert!(state.review().fallback);
    assert!(state.last_error().unwrap().contains("503"));
}

#[tokio::test]
async fn test_no_selected_sections_still_reviews() {
    let mut workflow = workflow(echo_client(analysis_with(&["Intro", "Budget"])));
    to_section_selection(&mut workflow).await;
    workflow.toggle_section("Intro").unwrap();
    workflow.toggle_section("Budget").unwrap();

    workflow.generate(|_| {}).await.unwrap();
    assert_eq!(workflow.state().proposal(), "");
    assert_eq!(workflow.state().phase(), Phase::Review);
    assert_eq!(workflow.client().calls(PromptKind::Section), 0);
    assert_eq!(workflow.client().calls(PromptKind::Review), 1);
}

#[tokio::test]
async fn test_refinement_failure_keeps_draft() {
    let analysis = analysis_with(&["Intro", "Budget"]);
    let client = StubClient::new(move |kind, prompt| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        PromptKind::Concepts => Ok(CONCEPTS.to_string()),
        PromptKind::Section => Ok(format!("SECTION:{}", section_title(prompt))),
        PromptKind::Review => Ok("Review".to_string()),
        PromptKind::Refinement => Err(ApiError::Blocked {
            reason: "SAFETY".to_string(),
        }),
    });
    let mut workflow = workflow(client);
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();

    let before = workflow.state().proposal().to_string();
    workflow.set_refinement_request("Make it shorter").unwrap();
    let err = workflow.refine().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Api(ApiError::Blocked { .. })));
    let state = workflow.state();
    assert_eq!(state.proposal(), before);
    assert_eq!(state.phase(), Phase::Review);
    assert_eq!(state.refinement_request(), "Make it shorter");
    assert!(state.last_error().unwrap().contains("SAFETY"));
}

#[tokio::test]
async fn test_refinement_replaces_document() {
    let mut workflow = workflow(echo_client(analysis_with(&["Intro", "Budget"])));
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();

    workflow.set_refinement_request("Tighten the intro").unwrap();
    workflow.refine().await.unwrap();

    let state = workflow.state();
    assert_eq!(state.proposal(), "## Intro\n\nRefined");
    assert_eq!(state.refinement_request(), "");
    assert_eq!(state.phase(), Phase::Download);

    let prompts = workflow.client().prompts.lock().unwrap();
    let (_, refinement) = prompts.last().unwrap();
    assert!(refinement.contains("SECTION:Budget"));
    assert!(refinement.contains("Strengths: clear need."));
    assert!(refinement.contains("Tighten the intro"));
}

// ============================================================================
// Degraded analysis and concepts
// ============================================================================

#[tokio::test]
async fn test_unstructured_analysis_proceeds_with_summary() {
    let client = StubClient::new(|_, _| Ok("The announcement funds rural clinics.".to_string()));
    let mut workflow = workflow(client);

    workflow.analyze("Announcement text").await.unwrap();
    let state = workflow.state();
    assert_eq!(state.phase(), Phase::Analyzing);
    assert_eq!(state.last_error(), Some(UNSTRUCTURED_ANALYSIS));
    assert_eq!(state.analysis().summary, "The announcement funds rural clinics.");
    assert!(state.analysis().scopes.is_empty());
    assert_eq!(state.sections().entries().len(), 7);
}

#[tokio::test]
async fn test_invalid_concepts_proceed_empty() {
    let analysis = analysis_with(&["Intro"]);
    let client = StubClient::new(move |kind, _| match kind {
        PromptKind::Analysis => Ok(analysis.clone()),
        _ => Ok("Here are some ideas: community gardens.".to_string()),
    });
    let mut workflow = workflow(client);
    workflow.analyze("Announcement text").await.unwrap();
    workflow.suggest_concepts().await.unwrap();

    let state = workflow.state();
    assert_eq!(state.phase(), Phase::ConceptSelection);
    assert!(state.concepts().is_empty());
    assert!(state.selected_concept().is_none());
    assert_eq!(state.last_error(), Some(INVALID_CONCEPTS));

    workflow.confirm_concept().unwrap();
    assert_eq!(workflow.state().phase(), Phase::OrgDetails);
}

#[tokio::test]
async fn test_analysis_api_error_allows_retry() {
    let attempts = Mutex::new(0);
    let client = StubClient::new(move |_, _| {
        let mut n = attempts.lock().unwrap();
        *n += 1;
        if *n == 1 {
            Err(ApiError::Transport { status: 429 })
        } else {
            Ok(TWO_SECTION_ANALYSIS.to_string())
        }
    });
    let mut workflow = workflow(client);

    let err = workflow.analyze("Announcement text").await.unwrap_err();
    assert_eq!(err, WorkflowError::Api(ApiError::Transport { status: 429 }));
    assert_eq!(workflow.state().phase(), Phase::Upload);
    assert!(workflow.state().last_error().unwrap().contains("429"));

    workflow.analyze("Announcement text").await.unwrap();
    assert_eq!(workflow.state().phase(), Phase::Analyzing);
    assert_eq!(workflow.state().last_error(), None);
}

#[tokio::test]
async fn test_operations_rejected_in_wrong_phase() {
    let mut workflow = workflow(echo_client(analysis_with(&["Intro"])));

    assert!(matches!(
        workflow.suggest_concepts().await,
        Err(WorkflowError::InvalidTransition {
            phase: Phase::Upload,
            ..
        })
    ));
    assert!(matches!(
        workflow.generate(|_| {}).await,
        Err(WorkflowError::InvalidTransition { .. })
    ));
    assert!(workflow.refine().await.is_err());
    assert!(workflow.set_refinement_request("x").is_err());
    assert_eq!(workflow.client().prompts.lock().unwrap().len(), 0);
}

// ============================================================================
// Restart
// ============================================================================

#[tokio::test]
async fn test_restart_resets_every_field() {
    let mut workflow = workflow(echo_client(analysis_with(&["Intro", "Budget"])));
    to_section_selection(&mut workflow).await;
    workflow.generate(|_| {}).await.unwrap();
    workflow.set_refinement_request("notes").unwrap();

    workflow.restart();

    let mut fresh = WorkflowState::new();
    fresh.restart();
    let state = workflow.state();
    assert_eq!(state, &fresh);
    assert_eq!(state.phase(), Phase::Upload);
    assert!(state.analysis().scopes.is_empty());
    assert!(state.analysis().required_sections.is_empty());
    assert_eq!(state.org_details(), &OrgDetails::default());
    assert_eq!(state.proposal(), "");
    assert_eq!(state.last_error(), None);
}

#[tokio::test]
async fn test_analysis_completed_after_restart_is_stale() {
    let client = echo_client(analysis_with(&["Intro"]));
    let prompts = PromptBuilder::bundled().unwrap();
    let mut state = WorkflowState::new();

    let ticket = state.begin_analysis("Announcement text").unwrap();
    let outcome = run_analysis(&client, &prompts, ticket.input()).await;
    state.restart();

    assert_eq!(state.complete_analysis(ticket, outcome), Err(WorkflowError::Stale));
    let mut fresh = WorkflowState::new();
    fresh.restart();
    assert_eq!(state, fresh);
}

#[tokio::test]
async fn test_generation_completed_after_restart_is_stale() {
    let mut workflow = workflow(echo_client(analysis_with(&["Intro", "Budget"])));
    to_section_selection(&mut workflow).await;

    let ticket = workflow.state_mut().begin_generation().unwrap();
    assert_eq!(workflow.state().phase(), Phase::Generating);

    let outcome = draft_and_review(workflow.client(), workflow.prompts(), ticket.input(), |_| {}).await;
    workflow.restart();
    let epoch = workflow.state().epoch();

    assert_eq!(
        workflow.state_mut().complete_generation(ticket, outcome),
        Err(WorkflowError::Stale)
    );
    assert_eq!(workflow.state().phase(), Phase::Upload);
    assert_eq!(workflow.state().proposal(), "");
    assert_eq!(workflow.state().epoch(), epoch);

    // The fresh session works normally
    workflow.analyze("Announcement text").await.unwrap();
    assert_eq!(workflow.state().phase(), Phase::Analyzing);
}
