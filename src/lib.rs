pub mod config;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod phases;
pub mod slug;
pub mod templates;

// Re-export main types
pub use config::{CliConfig, ModelConfig, OutputConfig, PromptConfig};
pub use ingest::{DocumentLoader, DocumentSource, IngestionError};
pub use llm::{ApiError, GeminiClient, LoggingClient, ModelClient};
pub use models::{AnalysisResult, Category, Concept, OrgDetails, ReviewReport};
pub use orchestrator::{Phase, Ticket, Workflow, WorkflowError, WorkflowState};
pub use output::{ExportedFiles, FileOutputWriter, OutputWriter};
pub use phases::{PromptBuilder, SectionKind, SectionProgress};

// Re-export slug utilities
pub use slug::{proposal_file_stem, session_slug, slugify, slugify_truncate};
