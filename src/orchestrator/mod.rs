pub mod state;
pub mod workflow;

pub use state::{
    ConceptRequest, GenerationOutcome, GenerationRequest, Phase, RefinementRequest,
    SCHEMA_VERSION, Ticket, WorkflowError, WorkflowState,
};
pub use workflow::{Workflow, draft_and_review};
