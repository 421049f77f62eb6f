//! Bundled default prompt templates for grant-forge.
//!
//! Templates are embedded in the binary using include_str! and can be
//! overridden per name by `<name>.j2` files on disk.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bundled analysis prompt
pub const ANALYSIS_TEMPLATE: &str = include_str!("../prompts/analysis.j2");

/// Bundled concept suggestion prompt
pub const CONCEPTS_TEMPLATE: &str = include_str!("../prompts/concepts.j2");

/// Bundled section drafting prompt
pub const SECTION_TEMPLATE: &str = include_str!("../prompts/section.j2");

/// Bundled review prompt
pub const REVIEW_TEMPLATE: &str = include_str!("../prompts/review.j2");

/// Bundled refinement prompt
pub const REFINEMENT_TEMPLATE: &str = include_str!("../prompts/refinement.j2");

/// Every template name the prompt builder registers
pub const TEMPLATE_NAMES: &[&str] = &["analysis", "concepts", "section", "review", "refinement"];

/// Template resolution result
#[derive(Debug)]
pub enum TemplateSource {
    /// Template loaded from a file path
    File(PathBuf),
    /// Template loaded from bundled default
    Bundled(&'static str),
}

impl TemplateSource {
    /// Get the template content
    pub fn content(&self) -> std::io::Result<String> {
        match self {
            TemplateSource::File(path) => std::fs::read_to_string(path),
            TemplateSource::Bundled(content) => Ok(content.to_string()),
        }
    }
}

/// Bundled template for `name`, if there is one
pub fn bundled_template(name: &str) -> Option<&'static str> {
    match name {
        "analysis" => Some(ANALYSIS_TEMPLATE),
        "concepts" => Some(CONCEPTS_TEMPLATE),
        "section" => Some(SECTION_TEMPLATE),
        "review" => Some(REVIEW_TEMPLATE),
        "refinement" => Some(REFINEMENT_TEMPLATE),
        _ => None,
    }
}

/// Resolve a template, falling back to the bundled default if no override exists.
///
/// Resolution priority:
/// 1. `<template_dir>/<name>.j2` when a template directory is configured
/// 2. Project-local `.grant-forge/prompts/<name>.j2`
/// 3. Bundled default
///
/// # Arguments
/// * `template_dir` - Configured override directory (may be relative)
/// * `base_dir` - Base directory to resolve relative paths from
/// * `name` - Template name (e.g., "analysis", "section")
pub fn resolve_template(
    template_dir: Option<&Path>,
    base_dir: &Path,
    name: &str,
) -> Result<TemplateSource> {
    let file_name = format!("{}.j2", name);

    // 1. Try configured directory
    if let Some(dir) = template_dir {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base_dir.join(dir)
        };
        let path = dir.join(&file_name);
        if path.exists() {
            debug!("Using {} template from configured dir: {:?}", name, path);
            return Ok(TemplateSource::File(path));
        }
    }

    // 2. Try project-local .grant-forge/prompts/
    let local_path = base_dir.join(".grant-forge/prompts").join(&file_name);
    if local_path.exists() {
        debug!("Using {} template from .grant-forge: {:?}", name, local_path);
        return Ok(TemplateSource::File(local_path));
    }

    // 3. Fall back to bundled default
    debug!("Using bundled default template for: {}", name);
    bundled_template(name)
        .map(TemplateSource::Bundled)
        .with_context(|| format!("Unknown prompt template: {}", name))
}

/// Convenience function to resolve and read a template.
pub fn load_template(template_dir: Option<&Path>, base_dir: &Path, name: &str) -> Result<String> {
    let source = resolve_template(template_dir, base_dir, name)?;
    source
        .content()
        .with_context(|| format!("Failed to read {} template from {:?}", name, source))
}
