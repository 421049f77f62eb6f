//! Slug and file-name utilities.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for session directory slugs
const MAX_SLUG_LENGTH: usize = 30;

/// File stem used when a proposal has no `## ` heading
pub const DEFAULT_FILE_STEM: &str = "grant_proposal";

static FIRST_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("invalid FIRST_HEADING regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid WHITESPACE_RUN regex"));

/// Convert a string to a URL-friendly slug (basic conversion).
///
/// Does NOT truncate - use `slugify_truncate` for length-limited slugs.
pub fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    // Collapse consecutive dashes and trim leading/trailing dashes
    let mut result = String::new();
    let mut prev_dash = true;
    for c in slug.chars() {
        if c == '-' {
            if !prev_dash {
                result.push(c);
            }
            prev_dash = true;
        } else {
            result.push(c);
            prev_dash = false;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Convert a string to a URL-friendly slug with truncation.
///
/// Truncates at word boundaries to stay under MAX_SLUG_LENGTH.
pub fn slugify_truncate(text: &str) -> String {
    let mut result = slugify(text);

    if result.len() > MAX_SLUG_LENGTH {
        // Back off to a char boundary before looking for a word break
        let mut limit = MAX_SLUG_LENGTH;
        while !result.is_char_boundary(limit) {
            limit -= 1;
        }
        if let Some(pos) = result[..limit].rfind('-') {
            result.truncate(pos);
        } else {
            result.truncate(limit);
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Export file stem derived from a proposal's first `## ` heading.
///
/// Characters other than ASCII alphanumerics and whitespace are dropped, whitespace
/// runs become `_`, and the result is lowercased.
pub fn proposal_file_stem(document: &str) -> String {
    let Some(heading) = FIRST_HEADING
        .captures(document)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return DEFAULT_FILE_STEM.to_string();
    };

    let kept: String = heading
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let stem = WHITESPACE_RUN
        .replace_all(kept.trim(), "_")
        .to_lowercase();

    if stem.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        stem
    }
}

/// Session directory name: UTC timestamp plus a short slug.
pub fn session_slug(label: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let slug = slugify_truncate(label);
    if slug.is_empty() {
        format!("{}-proposal", stamp)
    } else {
        format!("{}-{}", stamp, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test 123!"), "test-123");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }

    #[test]
    fn test_slugify_truncate_long_input() {
        let long = "Community Health Workers Expansion Initiative for Rural Counties";
        let slug = slugify_truncate(long);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
        assert_eq!(slug, "community-health-workers");
    }

    #[test]
    fn test_slugify_truncate_multibyte() {
        let slug = slugify_truncate("éééééééééééééééééééééééééééééééééé");
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.is_empty());
    }

    #[test]
    fn test_file_stem_from_first_heading() {
        let doc = "Intro text\n## Executive Summary: Phase 1!\n\nBody\n\n\n## Budget\n\nMore";
        assert_eq!(proposal_file_stem(doc), "executive_summary_phase_1");
    }

    #[test]
    fn test_file_stem_collapses_whitespace() {
        assert_eq!(proposal_file_stem("## Statement   of\tNeed"), "statement_of_need");
    }

    #[test]
    fn test_file_stem_default() {
        assert_eq!(proposal_file_stem("No headings here"), DEFAULT_FILE_STEM);
        assert_eq!(proposal_file_stem("### Only level three"), DEFAULT_FILE_STEM);
        assert_eq!(proposal_file_stem("## !!!"), DEFAULT_FILE_STEM);
    }

    #[test]
    fn test_session_slug_has_label() {
        let slug = session_slug("Helping Hands");
        assert!(slug.ends_with("-helping-hands"));
    }
}
