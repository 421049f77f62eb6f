//! Sequential drafting of the selected proposal sections.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::ModelClient;
use crate::models::{GeneratedSections, placeholder_text, section_block};

use super::{PhaseError, PromptBuilder, SectionContext};

/// Drafting progress, reported before each section and once at the end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProgress {
    pub completed: usize,
    pub total: usize,
    /// Title being drafted; `None` once the queue is drained
    pub current: Option<String>,
}

/// Result of drafting one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftedSection {
    pub title: String,
    /// Full `## <title>` block, a placeholder body on failure
    pub text: String,
    pub error: Option<String>,
}

impl DraftedSection {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Drafts sections one at a time from an ordered queue.
///
/// A failed section gets a placeholder block and the loop moves on; the loop
/// always drains the whole queue.
pub struct SectionGenerationLoop<'a, C: ?Sized> {
    client: &'a C,
    prompts: &'a PromptBuilder,
    queue: VecDeque<String>,
}

impl<'a, C: ModelClient + ?Sized> SectionGenerationLoop<'a, C> {
    pub fn new(
        client: &'a C,
        prompts: &'a PromptBuilder,
        titles: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            client,
            prompts,
            queue: titles.into_iter().collect(),
        }
    }

    /// Drain the queue, returning one outcome per title in queue order.
    pub async fn run(
        mut self,
        ctx: &SectionContext<'_>,
        mut on_progress: impl FnMut(&SectionProgress),
    ) -> Vec<DraftedSection> {
        let total = self.queue.len();
        let mut drafted = Vec::with_capacity(total);

        while let Some(title) = self.queue.pop_front() {
            on_progress(&SectionProgress {
                completed: drafted.len(),
                total,
                current: Some(title.clone()),
            });
            info!(section = %title, index = drafted.len() + 1, total, "Drafting section");

            let section = match self.draft_one(ctx, &title).await {
                Ok(body) => DraftedSection {
                    text: section_block(&title, &body),
                    title,
                    error: None,
                },
                Err(e) => {
                    warn!(section = %title, error = %e, "Section drafting failed");
                    DraftedSection {
                        text: section_block(&title, &placeholder_text(&title)),
                        error: Some(format!("Error generating section '{}': {}", title, e)),
                        title,
                    }
                }
            };
            drafted.push(section);
        }

        on_progress(&SectionProgress {
            completed: total,
            total,
            current: None,
        });

        drafted
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.queue.len()
    }

    async fn draft_one(&self, ctx: &SectionContext<'_>, title: &str) -> Result<String, PhaseError> {
        let prompt = self.prompts.section(ctx, title)?;
        Ok(self.client.send(&prompt).await?)
    }
}

/// Key the drafted blocks by title.
pub fn collect_sections(drafted: &[DraftedSection]) -> GeneratedSections {
    drafted
        .iter()
        .map(|s| (s.title.clone(), s.text.clone()))
        .collect()
}
