use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Section list used when the announcement names none (or the analysis failed)
pub const DEFAULT_REQUIRED_SECTIONS: &[&str] = &[
    "Executive Summary",
    "Statement of Need",
    "Project Description",
    "Goals and Objectives",
    "Evaluation Plan",
    "Budget and Budget Justification",
    "Organizational Capacity",
];

/// Summary used when the model returns an object without one
pub const MISSING_SUMMARY: &str = "No summary provided.";

/// Structured reading of a funding announcement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub scopes: Vec<NamedItem>,
    pub programs: Vec<NamedItem>,
    pub focus_areas: Vec<NamedItem>,
    pub required_sections: Vec<String>,
}

/// A selectable scope, program, or focus area
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The three selectable lists of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Scopes,
    Programs,
    FocusAreas,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Scopes, Category::Programs, Category::FocusAreas];

    /// Label used in prompts and CLI output
    pub fn label(self) -> &'static str {
        match self {
            Category::Scopes => "Scopes of Service",
            Category::Programs => "Programs",
            Category::FocusAreas => "Focus Areas",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Scopes => write!(f, "scopes"),
            Category::Programs => write!(f, "programs"),
            Category::FocusAreas => write!(f, "focusAreas"),
        }
    }
}

impl AnalysisResult {
    /// Validate an untyped JSON object into an analysis.
    ///
    /// No field is trusted: non-array lists become empty, list entries that are
    /// neither objects with a `name` nor plain strings are dropped, and an empty
    /// section list falls back to [`DEFAULT_REQUIRED_SECTIONS`].
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let summary = object
            .get("summary")
            .and_then(summary_text)
            .unwrap_or_else(|| MISSING_SUMMARY.to_string());

        let required_sections = object
            .get("requiredSections")
            .map(section_titles)
            .filter(|titles| !titles.is_empty())
            .unwrap_or_else(default_sections);

        Self {
            summary,
            scopes: named_items(object.get("scopes")),
            programs: named_items(object.get("programs")),
            focus_areas: named_items(object.get("focusAreas")),
            required_sections,
        }
    }

    /// Fallback analysis when the response carried no usable JSON: the raw text
    /// becomes the summary and nothing is selectable.
    pub fn from_raw_summary(raw: &str) -> Self {
        Self {
            summary: raw.to_string(),
            scopes: Vec::new(),
            programs: Vec::new(),
            focus_areas: Vec::new(),
            required_sections: default_sections(),
        }
    }

    pub fn items(&self, category: Category) -> &[NamedItem] {
        match category {
            Category::Scopes => &self.scopes,
            Category::Programs => &self.programs,
            Category::FocusAreas => &self.focus_areas,
        }
    }
}

pub fn default_sections() -> Vec<String> {
    DEFAULT_REQUIRED_SECTIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn summary_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        // Some models return the bulleted summary as an array of lines
        Value::Array(lines) => {
            let joined = lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            (!joined.trim().is_empty()).then_some(joined)
        }
        _ => None,
    }
}

fn named_items(value: Option<&Value>) -> Vec<NamedItem> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => {
                let name = fields.get("name").and_then(Value::as_str)?.trim();
                if name.is_empty() {
                    return None;
                }
                let description = fields
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(NamedItem {
                    name: name.to_string(),
                    description: description.trim().to_string(),
                })
            }
            Value::String(name) if !name.trim().is_empty() => Some(NamedItem {
                name: name.trim().to_string(),
                description: String::new(),
            }),
            _ => None,
        })
        .collect()
}

fn section_titles(value: &Value) -> Vec<String> {
    let Value::Array(entries) = value else {
        return Vec::new();
    };

    let mut titles: Vec<String> = Vec::new();
    for title in entries.iter().filter_map(Value::as_str).map(str::trim) {
        if !title.is_empty() && !titles.iter().any(|t| t == title) {
            titles.push(title.to_string());
        }
    }
    titles
}
