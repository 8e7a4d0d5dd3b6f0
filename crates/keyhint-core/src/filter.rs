//! Filter engine
//!
//! Given the merged registry, the alias table and the held modifiers, build
//! the list the overlay shows. Matching is a case-insensitive prefix test
//! against a string built from the held modifiers in display order, so
//! holding Ctrl and Shift selects every key starting with `Ctrl+Shift+`.
//!
//! Results are split into the user's configured shortcuts (listed first)
//! and everything else, each sorted by key. The functions here are pure:
//! the same inputs always give the same output.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::modifiers::{Modifier, ModifierState};
use crate::registry::{MergedView, ShortcutMap};

/// Overlay caption when no modifier suffix applies.
pub const BASE_CAPTION: &str = "Available Shortcuts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterEntry {
    pub key: String,
    pub description: String,
    /// For alias entries, the key whose description was borrowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
}

impl FilterEntry {
    /// The key as the overlay prints it: `Shift+Alt+Enter` becomes
    /// `SHIFT + ALT + ENTER`.
    pub fn keycap(&self) -> String {
        let parts: Vec<&str> = self.key.split('+').collect();
        let mut modifiers = Vec::new();
        let mut final_key = None;

        for part in &parts {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.push(Modifier::Ctrl.label()),
                "super" => modifiers.push(Modifier::Super.label()),
                "alt" => modifiers.push(Modifier::Alt.label()),
                "shift" => modifiers.push(Modifier::Shift.label()),
                _ => {
                    final_key = Some(*part);
                    break;
                }
            }
        }

        // A key made only of modifier names repeats the last one
        let final_key = final_key
            .or_else(|| parts.last().copied())
            .unwrap_or_default()
            .to_uppercase();

        if modifiers.is_empty() {
            final_key
        } else {
            format!("{} + {}", modifiers.join(" + "), final_key)
        }
    }
}

/// The overlay contents for one modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub label: String,
    /// Matching shortcuts the user configured
    pub priority: Vec<FilterEntry>,
    /// Matching imported shortcuts and aliases
    pub secondary: Vec<FilterEntry>,
}

impl FilterResult {
    /// No entries and the bare caption.
    pub fn empty() -> Self {
        Self {
            label: BASE_CAPTION.to_string(),
            priority: Vec::new(),
            secondary: Vec::new(),
        }
    }

    /// All entries, priority group first.
    pub fn entries(&self) -> impl Iterator<Item = &FilterEntry> {
        self.priority.iter().chain(self.secondary.iter())
    }

    pub fn len(&self) -> usize {
        self.priority.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.secondary.is_empty()
    }

    /// Whether a renderer should draw a separator between the groups.
    pub fn has_separator(&self) -> bool {
        !self.priority.is_empty() && !self.secondary.is_empty()
    }
}

/// Prefix that canonical keys must start with for the given state, or
/// `None` when no qualifying modifier is held.
pub fn search_prefix(state: &ModifierState) -> Option<String> {
    if !state.any_qualifying() {
        return None;
    }
    Some(state.held().map(|m| format!("{}+", m)).collect())
}

/// Overlay caption for the given state, e.g.
/// `Available Shortcuts (CTRL + SHIFT + ...)`.
pub fn caption(state: &ModifierState) -> String {
    if state.is_empty() {
        return BASE_CAPTION.to_string();
    }
    let labels: Vec<&str> = state.held().map(Modifier::label).collect();
    format!("{} ({} + ...)", BASE_CAPTION, labels.join(" + "))
}

fn by_key(a: &FilterEntry, b: &FilterEntry) -> Ordering {
    a.key
        .to_lowercase()
        .cmp(&b.key.to_lowercase())
        .then_with(|| a.key.cmp(&b.key))
}

/// Filter the merged view for the held modifiers.
///
/// Holding nothing, or only Shift, yields [`FilterResult::empty`].
pub fn filter(view: &MergedView, aliases: &ShortcutMap, state: &ModifierState) -> FilterResult {
    let Some(prefix) = search_prefix(state) else {
        return FilterResult::empty();
    };

    let mut result = filter_with_prefix(view, aliases, &prefix);
    result.label = caption(state);
    result
}

/// Every shortcut and alias, grouped and sorted, under the bare caption.
pub fn overview(view: &MergedView, aliases: &ShortcutMap) -> FilterResult {
    filter_with_prefix(view, aliases, "")
}

/// Select entries whose key starts with `prefix`, ignoring case.
///
/// Aliases matching the prefix are included when their target exists in the
/// view, described as `<target description> (via <target>)`.
pub fn filter_with_prefix(view: &MergedView, aliases: &ShortcutMap, prefix: &str) -> FilterResult {
    let prefix = prefix.to_lowercase();
    let mut selected: HashMap<&str, FilterEntry> = HashMap::new();

    for (key, entry) in view.iter() {
        if key.to_lowercase().starts_with(&prefix) {
            selected.insert(
                key,
                FilterEntry {
                    key: key.to_string(),
                    description: entry.description.clone(),
                    alias_of: None,
                },
            );
        }
    }

    for (alias, target) in aliases {
        if !alias.to_lowercase().starts_with(&prefix) {
            continue;
        }
        if let Some(description) = view.description(target) {
            selected.insert(
                alias.as_str(),
                FilterEntry {
                    key: alias.clone(),
                    description: format!("{} (via {})", description, target),
                    alias_of: Some(target.clone()),
                },
            );
        }
    }

    let (mut priority, mut secondary): (Vec<_>, Vec<_>) = selected
        .into_values()
        .partition(|entry| view.is_configured(&entry.key));
    priority.sort_by(by_key);
    secondary.sort_by(by_key);

    FilterResult {
        label: BASE_CAPTION.to_string(),
        priority,
        secondary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::merge;

    fn map(pairs: &[(&str, &str)]) -> ShortcutMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keys(entries: &[FilterEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    fn sample_view() -> MergedView {
        let imported = map(&[
            ("Super+Left", "Move To Side W"),
            ("Super+Right", "Move To Side E"),
            ("Super+Shift+Up", "Move To Monitor Up"),
            ("Shift+T", "Reopen Tab"),
            ("Insert", "Cut"),
        ]);
        let configured = map(&[
            ("Ctrl+C", "Copy"),
            ("ctrl+shift+v", "Paste Plain"),
            ("Super+d", "Show Desktop"),
        ]);
        merge(&imported, &configured)
    }

    #[test]
    fn test_nothing_held_is_empty() {
        let result = filter(&sample_view(), &ShortcutMap::new(), &ModifierState::default());
        assert!(result.is_empty());
        assert_eq!(result.label, BASE_CAPTION);
    }

    #[test]
    fn test_shift_alone_is_empty() {
        let state = ModifierState::with_held(&[Modifier::Shift]);
        let result = filter(&sample_view(), &ShortcutMap::new(), &state);
        assert!(result.is_empty());
        assert_eq!(result, FilterResult::empty());
    }

    #[test]
    fn test_search_prefix_display_order() {
        let state = ModifierState::with_held(&[Modifier::Shift, Modifier::Ctrl]);
        assert_eq!(search_prefix(&state).as_deref(), Some("Ctrl+Shift+"));

        let state = ModifierState::with_held(&[Modifier::Alt, Modifier::Super, Modifier::Ctrl]);
        assert_eq!(search_prefix(&state).as_deref(), Some("Ctrl+Super+Alt+"));
    }

    #[test]
    fn test_caption() {
        let state = ModifierState::with_held(&[Modifier::Super, Modifier::Ctrl]);
        assert_eq!(caption(&state), "Available Shortcuts (CTRL + SUPER + ...)");
        assert_eq!(caption(&ModifierState::default()), "Available Shortcuts");
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let state = ModifierState::with_held(&[Modifier::Ctrl, Modifier::Shift]);
        let result = filter(&sample_view(), &ShortcutMap::new(), &state);

        assert_eq!(keys(&result.priority), vec!["ctrl+shift+v"]);
        assert!(result.secondary.is_empty());
        assert_eq!(result.label, "Available Shortcuts (CTRL + SHIFT + ...)");
    }

    #[test]
    fn test_filter_selects_exactly_prefixed_keys() {
        let view = sample_view();
        let state = ModifierState::with_held(&[Modifier::Super]);
        let result = filter(&view, &ShortcutMap::new(), &state);

        let listed: Vec<&str> = result.entries().map(|e| e.key.as_str()).collect();
        for (key, _) in view.iter() {
            let expected = key.to_lowercase().starts_with("super+");
            assert_eq!(listed.contains(&key), expected, "key {}", key);
        }
        assert_eq!(keys(&result.priority), vec!["Super+d"]);
        assert_eq!(
            keys(&result.secondary),
            vec!["Super+Left", "Super+Right", "Super+Shift+Up"]
        );
        assert!(result.has_separator());
    }

    #[test]
    fn test_alias_included_with_via_description() {
        let view = sample_view();
        let aliases = map(&[("Shift+Delete", "Insert")]);

        let result = filter_with_prefix(&view, &aliases, "Shift+");
        let alias = result
            .entries()
            .find(|e| e.key == "Shift+Delete")
            .expect("alias entry");
        assert_eq!(alias.description, "Cut (via Insert)");
        assert_eq!(alias.alias_of.as_deref(), Some("Insert"));
    }

    #[test]
    fn test_alias_surfaces_for_held_modifiers() {
        let view = sample_view();
        let aliases = map(&[("Super+Shift+Delete", "Insert")]);
        let state = ModifierState::with_held(&[Modifier::Super, Modifier::Shift]);

        let result = filter(&view, &aliases, &state);
        assert_eq!(
            keys(&result.secondary),
            vec!["Super+Shift+Delete", "Super+Shift+Up"]
        );
        assert_eq!(result.secondary[0].description, "Cut (via Insert)");
    }

    #[test]
    fn test_alias_with_missing_target_skipped() {
        let aliases = map(&[("Super+X", "Nowhere")]);
        let state = ModifierState::with_held(&[Modifier::Super]);

        let result = filter(&sample_view(), &aliases, &state);
        assert!(result.entries().all(|e| e.key != "Super+X"));
    }

    #[test]
    fn test_alias_not_matching_prefix_skipped() {
        let aliases = map(&[("Shift+Delete", "Insert")]);
        let state = ModifierState::with_held(&[Modifier::Ctrl]);

        let result = filter(&sample_view(), &aliases, &state);
        assert!(result.entries().all(|e| e.key != "Shift+Delete"));
    }

    #[test]
    fn test_grouping_configured_first_then_sorted() {
        let view = merge(&map(&[("ab", "Y"), ("aa", "Z")]), &map(&[("a", "X")]));

        let result = filter_with_prefix(&view, &ShortcutMap::new(), "");
        assert_eq!(keys(&result.priority), vec!["a"]);
        assert_eq!(keys(&result.secondary), vec!["aa", "ab"]);
        let all: Vec<&str> = result.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(all, vec!["a", "aa", "ab"]);
    }

    #[test]
    fn test_sort_ignores_case_with_stable_tiebreak() {
        let view = merge(
            &map(&[("Super+b", "1"), ("Super+A", "2"), ("Super+a", "3"), ("Super+C", "4")]),
            &ShortcutMap::new(),
        );
        let state = ModifierState::with_held(&[Modifier::Super]);

        let result = filter(&view, &ShortcutMap::new(), &state);
        assert_eq!(
            keys(&result.secondary),
            vec!["Super+A", "Super+a", "Super+b", "Super+C"]
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let view = sample_view();
        let aliases = map(&[("Super+Shift+Delete", "Insert"), ("Super+Home", "Super+Left")]);
        let state = ModifierState::with_held(&[Modifier::Super]);

        let first = filter(&view, &aliases, &state);
        let second = filter(&view, &aliases, &state);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_overview_lists_everything() {
        let view = sample_view();
        let aliases = map(&[("Shift+Delete", "Insert")]);

        let result = overview(&view, &aliases);
        assert_eq!(result.len(), view.len() + 1);
        assert_eq!(result.label, BASE_CAPTION);
        assert_eq!(keys(&result.priority), vec!["Ctrl+C", "ctrl+shift+v", "Super+d"]);
    }

    #[test]
    fn test_keycap() {
        let entry = |key: &str| FilterEntry {
            key: key.to_string(),
            description: String::new(),
            alias_of: None,
        };

        assert_eq!(entry("Shift+Alt+Enter").keycap(), "SHIFT + ALT + ENTER");
        assert_eq!(entry("Ctrl+c").keycap(), "CTRL + C");
        assert_eq!(entry("Super+Left").keycap(), "SUPER + LEFT");
        assert_eq!(entry("PageUp").keycap(), "PAGEUP");
        assert_eq!(entry("Ctrl+Shift").keycap(), "CTRL + SHIFT + SHIFT");
    }
}
