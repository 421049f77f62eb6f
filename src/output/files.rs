use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::config::OutputConfig;
use crate::models::ReviewReport;
use crate::orchestrator::WorkflowState;
use crate::slug::proposal_file_stem;

use super::{ExportedFiles, OutputWriter, html_document};

/// File-based output writer.
///
/// Snapshots go to `<runs_dir>/<session>/`; the exported proposal and its
/// review go to the active directory.
pub struct FileOutputWriter {
    config: OutputConfig,
    session: String,
}

impl FileOutputWriter {
    pub fn new(config: OutputConfig, session: impl Into<String>) -> Self {
        Self {
            config,
            session: session.into(),
        }
    }

    /// Directory holding this session's snapshots
    pub fn session_dir(&self) -> PathBuf {
        self.config.runs_dir.join(&self.session)
    }

    pub fn active_dir(&self) -> &Path {
        &self.config.active_dir
    }

    async fn ensure_session_dir(&self) -> Result<PathBuf> {
        let dir = self.session_dir();
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create session directory")?;
        Ok(dir)
    }

    async fn ensure_active_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.active_dir)
            .await
            .context("Failed to create active output directory")
    }

    fn review_markdown(review: &ReviewReport) -> String {
        let mut md = String::from("# Final Review\n\n");
        if review.fallback {
            md.push_str("**Status**: Review unavailable\n\n");
        }
        if let Some(error) = &review.error {
            md.push_str(&format!("**Error**: {}\n\n", error));
        }
        md.push_str(&review.text);
        md.push('\n');
        md
    }
}

#[async_trait]
impl OutputWriter for FileOutputWriter {
    async fn write_snapshot(&self, state: &WorkflowState) -> Result<PathBuf> {
        let dir = self.ensure_session_dir().await?;

        let file_name = state.snapshot_file_name();
        let path = dir.join(&file_name);
        let temp = dir.join(format!(".{}.tmp", file_name));

        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;

        // Write to temp file first, then rename into place
        fs::write(&temp, json)
            .await
            .context("Failed to write temp state file")?;
        fs::rename(&temp, &path)
            .await
            .context("Failed to rename state file")?;

        info!("Wrote {} snapshot to {:?}", state.phase(), path);
        Ok(path)
    }

    async fn write_review(&self, review: &ReviewReport) -> Result<PathBuf> {
        self.ensure_active_dir().await?;

        let path = self.config.active_dir.join("review.md");
        fs::write(&path, Self::review_markdown(review))
            .await
            .context("Failed to write review")?;

        info!("Wrote review to {:?}", path);
        Ok(path)
    }

    async fn write_final(&self, proposal: &str, review: &ReviewReport) -> Result<ExportedFiles> {
        if proposal.trim().is_empty() {
            anyhow::bail!("No proposal content to export");
        }
        self.ensure_active_dir().await?;

        let stem = proposal_file_stem(proposal);
        let markdown = self.config.active_dir.join(format!("{}.md", stem));
        let html = self.config.active_dir.join(format!("{}.html", stem));

        fs::write(&markdown, proposal)
            .await
            .with_context(|| format!("Failed to write {:?}", markdown))?;
        fs::write(&html, html_document(&stem, proposal))
            .await
            .with_context(|| format!("Failed to write {:?}", html))?;

        let review = if review.is_empty() {
            None
        } else {
            Some(self.write_review(review).await?)
        };

        info!("Wrote proposal to {:?} and {:?}", markdown, html);
        Ok(ExportedFiles {
            markdown,
            html,
            review,
        })
    }
}
