use serde::{Deserialize, Serialize};

use super::analysis::{Category, NamedItem};

/// User picks among the analysis' scopes, programs, and focus areas.
///
/// Each list is kept in the order the analysis presented the items, so
/// toggling an item twice restores the exact previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selections {
    pub scopes: Vec<String>,
    pub programs: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl Selections {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Scopes => &self.scopes,
            Category::Programs => &self.programs,
            Category::FocusAreas => &self.focus_areas,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Scopes => &mut self.scopes,
            Category::Programs => &mut self.programs,
            Category::FocusAreas => &mut self.focus_areas,
        }
    }

    /// Flip `item` in `category`, given the category's available items.
    ///
    /// Returns `Some(true)` when the item is now selected, `Some(false)` when it
    /// was deselected, and `None` when `item` is not one of `available`.
    pub fn toggle(&mut self, category: Category, item: &str, available: &[NamedItem]) -> Option<bool> {
        let position_of = |name: &str| available.iter().position(|i| i.name == name);
        position_of(item)?;

        let selected = self.get_mut(category);
        if let Some(index) = selected.iter().position(|s| s == item) {
            selected.remove(index);
            return Some(false);
        }

        selected.push(item.to_string());
        selected.sort_by_key(|name| position_of(name).unwrap_or(usize::MAX));
        Some(true)
    }

    /// Comma-joined list for prompts, or "Not specified"
    pub fn joined(&self, category: Category) -> String {
        let selected = self.get(category);
        if selected.is_empty() {
            "Not specified".to_string()
        } else {
            selected.join(", ")
        }
    }
}

/// One row of the section checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionToggle {
    pub title: String,
    pub selected: bool,
}

/// Which required sections to draft, keyed by title, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSelection {
    entries: Vec<SectionToggle>,
}

impl SectionSelection {
    /// Every title selected, in the given order
    pub fn all_selected(titles: &[String]) -> Self {
        titles.iter().map(|t| (t.clone(), true)).collect()
    }

    pub fn entries(&self) -> &[SectionToggle] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.title == title && e.selected)
    }

    /// Flip a section; `None` if the title is unknown.
    pub fn toggle(&mut self, title: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.title == title)?;
        entry.selected = !entry.selected;
        Some(entry.selected)
    }

    /// Titles of `required` that are selected, in `required` order.
    ///
    /// The selection's own insertion order never affects the result.
    pub fn selected_in<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|title| self.is_selected(title))
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<(String, bool)> for SectionSelection {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        let mut entries: Vec<SectionToggle> = Vec::new();
        for (title, selected) in iter {
            match entries.iter_mut().find(|e| e.title == title) {
                Some(existing) => existing.selected = selected,
                None => entries.push(SectionToggle { title, selected }),
            }
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(names: &[&str]) -> Vec<NamedItem> {
        names
            .iter()
            .map(|n| NamedItem {
                name: n.to_string(),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_toggle_twice_is_identity_for_every_item_and_category() {
        let available = items(&["A", "B", "C", "D"]);
        let starting_points = [vec![], vec!["B".to_string()], vec!["A".to_string(), "C".to_string(), "D".to_string()]];

        for category in Category::ALL {
            for start in &starting_points {
                for item in ["A", "B", "C", "D"] {
                    let mut selections = Selections::default();
                    for name in start {
                        selections.toggle(category, name, &available);
                    }
                    let original = selections.clone();

                    selections.toggle(category, item, &available);
                    selections.toggle(category, item, &available);

                    assert_eq!(selections, original, "{category} {item} from {start:?}");
                }
            }
        }
    }

    #[test]
    fn test_toggle_keeps_analysis_order() {
        let available = items(&["A", "B", "C"]);
        let mut selections = Selections::default();
        selections.toggle(Category::Programs, "C", &available);
        selections.toggle(Category::Programs, "A", &available);
        assert_eq!(selections.programs, vec!["A", "C"]);
        assert!(selections.scopes.is_empty());
    }

    #[test]
    fn test_toggle_unknown_item() {
        let mut selections = Selections::default();
        assert_eq!(selections.toggle(Category::Scopes, "X", &items(&["A"])), None);
        assert!(selections.scopes.is_empty());
    }

    #[test]
    fn test_joined() {
        let available = items(&["A", "B"]);
        let mut selections = Selections::default();
        assert_eq!(selections.joined(Category::FocusAreas), "Not specified");
        selections.toggle(Category::FocusAreas, "B", &available);
        selections.toggle(Category::FocusAreas, "A", &available);
        assert_eq!(selections.joined(Category::FocusAreas), "A, B");
    }

    #[test]
    fn test_section_selection_order_independent() {
        let required = vec!["Intro".to_string(), "Need".to_string(), "Budget".to_string()];
        let reversed: SectionSelection = vec![
            ("Budget".to_string(), true),
            ("Need".to_string(), false),
            ("Intro".to_string(), true),
        ]
        .into_iter()
        .collect();

        assert_eq!(reversed.selected_in(&required), vec!["Intro", "Budget"]);
    }

    #[test]
    fn test_section_toggle() {
        let mut selection = SectionSelection::all_selected(&["Intro".to_string()]);
        assert_eq!(selection.toggle("Intro"), Some(false));
        assert!(!selection.is_selected("Intro"));
        assert_eq!(selection.toggle("Missing"), None);
        assert_eq!(selection.entries().len(), 1);
    }
}
