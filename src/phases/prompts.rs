//! Prompt construction for every model-backed phase.
//!
//! All templates are compiled when the builder is created, so a broken
//! override fails at startup instead of halfway through a session.

use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior, Value, context};
use thiserror::Error;

use crate::config::PromptConfig;
use crate::models::{Category, Concept, OrgDetails, Selections};
use crate::templates::{TEMPLATE_NAMES, bundled_template, load_template};

/// Failure to render a prompt template
#[derive(Debug, Error)]
#[error("failed to render {name} prompt: {source}")]
pub struct PromptError {
    pub name: &'static str,
    #[source]
    pub source: minijinja::Error,
}

/// Task category of a proposal section, derived from its title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Generic,
    Budget,
    Outcomes,
}

impl SectionKind {
    /// Case-insensitive keyword match; "budget" wins over outcome keywords.
    pub fn classify(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("budget") {
            SectionKind::Budget
        } else if title.contains("outcome") || title.contains("evaluation") {
            SectionKind::Outcomes
        } else {
            SectionKind::Generic
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SectionKind::Generic => "generic",
            SectionKind::Budget => "budget",
            SectionKind::Outcomes => "outcomes",
        }
    }
}

/// Everything the shared section preamble embeds
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    pub summary: &'a str,
    pub selections: &'a Selections,
    pub concept: Option<&'a Concept>,
    pub org: &'a OrgDetails,
}

/// Renders phase prompts from the bundled (or overridden) templates
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    /// Builder over the bundled templates only
    pub fn bundled() -> Result<Self> {
        Self::from_sources(|name| {
            bundled_template(name)
                .map(str::to_string)
                .with_context(|| format!("Unknown prompt template: {}", name))
        })
    }

    /// Builder honoring configured and project-local overrides
    pub fn new(config: &PromptConfig, base_dir: &Path) -> Result<Self> {
        Self::from_sources(|name| load_template(config.template_dir.as_deref(), base_dir, name))
    }

    fn from_sources(mut source: impl FnMut(&str) -> Result<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        for name in TEMPLATE_NAMES {
            let content = source(name)?;
            env.add_template_owned(name.to_string(), content)
                .with_context(|| format!("Invalid {} prompt template", name))?;
        }

        Ok(Self { env })
    }

    fn render(&self, name: &'static str, ctx: Value) -> Result<String, PromptError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|source| PromptError { name, source })
    }

    /// Ask for the five-key analysis object over the raw announcement text.
    pub fn analysis(&self, document: &str) -> Result<String, PromptError> {
        self.render("analysis", context! { document => document })
    }

    /// Ask for exactly three project concepts.
    pub fn concepts(&self, summary: &str, selections: &Selections) -> Result<String, PromptError> {
        self.render(
            "concepts",
            context! {
                summary => summary,
                scopes => selections.joined(Category::Scopes),
                programs => selections.joined(Category::Programs),
                focus_areas => selections.joined(Category::FocusAreas),
            },
        )
    }

    /// Shared preamble plus the task clause for `title`'s [`SectionKind`].
    pub fn section(&self, ctx: &SectionContext<'_>, title: &str) -> Result<String, PromptError> {
        let org = ctx.org;
        self.render(
            "section",
            context! {
                summary => ctx.summary,
                scopes => ctx.selections.joined(Category::Scopes),
                programs => ctx.selections.joined(Category::Programs),
                focus_areas => ctx.selections.joined(Category::FocusAreas),
                concept => ctx.concept.map(|c| c.name.as_str()).unwrap_or("Not specified"),
                org_name => org.name.as_str(),
                mission => org.mission.as_str(),
                past_experience => org.past_experience.as_str(),
                max_budget => or_not_specified(&org.max_budget, |v| format!("${}", v)),
                time_frame => or_not_specified(&org.time_frame, |v| format!("{} months", v)),
                budget_months => non_empty_or(&org.time_frame, "12"),
                budget_cap => non_empty_or(&org.max_budget, "100000"),
                kind => SectionKind::classify(title).as_str(),
                title => title,
            },
        )
    }

    /// Ask for strengths and an actionable improvement list for the full draft.
    pub fn review(&self, summary: &str, document: &str) -> Result<String, PromptError> {
        self.render(
            "review",
            context! { summary => summary, document => document },
        )
    }

    /// Ask for a complete replacement document.
    pub fn refinement(
        &self,
        summary: &str,
        draft: &str,
        review: &str,
        notes: &str,
    ) -> Result<String, PromptError> {
        self.render(
            "refinement",
            context! {
                summary => summary,
                draft => draft,
                review => review,
                notes => notes,
            },
        )
    }
}

fn or_not_specified(value: &str, format: impl Fn(&str) -> String) -> String {
    let value = value.trim();
    if value.is_empty() {
        "Not specified".to_string()
    } else {
        format(value)
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    let value = value.trim().trim_start_matches('$');
    if value.is_empty() { default } else { value }
}
