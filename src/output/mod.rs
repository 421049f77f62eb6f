pub mod files;
pub mod markup;

pub use files::*;
pub use markup::{escape_html, html_document, markdown_to_html};

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ReviewReport;
use crate::orchestrator::WorkflowState;

/// Paths written by a final export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub markdown: PathBuf,
    pub html: PathBuf,
    pub review: Option<PathBuf>,
}

/// Trait for writing session outputs
#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Write the session state after a completed phase
    async fn write_snapshot(&self, state: &WorkflowState) -> Result<PathBuf>;

    /// Write the final review report
    async fn write_review(&self, review: &ReviewReport) -> Result<PathBuf>;

    /// Write the proposal as markdown and HTML
    async fn write_final(&self, proposal: &str, review: &ReviewReport) -> Result<ExportedFiles>;
}
