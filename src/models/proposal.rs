use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between section blocks: two blank lines
pub const SECTION_SEPARATOR: &str = "\n\n\n";

/// Maximum number of concepts kept from a suggestion response
pub const MAX_CONCEPTS: usize = 3;

/// A suggested project concept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Concept {
    /// Validate a JSON array of `{name, description}` objects, keeping at most
    /// [`MAX_CONCEPTS`] well-formed entries.
    pub fn list_from_json(value: &Value) -> Vec<Concept> {
        let Some(entries) = value.as_array() else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name").and_then(Value::as_str)?.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Concept {
                    name: name.to_string(),
                    description: entry
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                })
            })
            .take(MAX_CONCEPTS)
            .collect()
    }
}

/// Applicant organization and project framing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgDetails {
    pub name: String,
    pub mission: String,
    pub past_experience: String,
    /// Maximum budget in dollars, as entered
    pub max_budget: String,
    /// Project length in months, as entered
    pub time_frame: String,
}

/// Drafted section text keyed by section title
pub type GeneratedSections = BTreeMap<String, String>;

/// `"## <title>\n\n<body>"`
pub fn section_block(title: &str, body: &str) -> String {
    format!("## {title}\n\n{body}")
}

/// Body substituted when drafting a section fails
pub fn placeholder_text(title: &str) -> String {
    format!("Could not generate the '{title}' section.")
}
