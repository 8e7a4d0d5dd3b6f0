//! Shortcut registry
//!
//! Two sources feed the overlay: shortcuts imported from the desktop and
//! shortcuts configured by the user. The registry keeps both and exposes a
//! merged view in which configured descriptions override imported ones.

use std::collections::HashMap;

use serde::Serialize;

/// Canonical shortcut key -> description.
pub type ShortcutMap = HashMap<String, String>;

/// Where a merged entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Configured,
    Imported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub description: String,
    pub origin: Origin,
}

/// Imported shortcuts overlaid by configured ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedView {
    entries: HashMap<String, MergedEntry>,
}

impl MergedView {
    pub fn get(&self, key: &str) -> Option<&MergedEntry> {
        self.entries.get(key)
    }

    pub fn description(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.description.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True when `key` is one of the user's configured shortcuts.
    pub fn is_configured(&self, key: &str) -> bool {
        matches!(
            self.entries.get(key),
            Some(MergedEntry {
                origin: Origin::Configured,
                ..
            })
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MergedEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge imported and configured shortcuts.
///
/// Every key from either map is present in the result; when both define a
/// key the configured description wins.
pub fn merge(imported: &ShortcutMap, configured: &ShortcutMap) -> MergedView {
    let mut entries = HashMap::with_capacity(imported.len() + configured.len());

    for (key, description) in imported {
        entries.insert(
            key.clone(),
            MergedEntry {
                description: description.clone(),
                origin: Origin::Imported,
            },
        );
    }
    for (key, description) in configured {
        entries.insert(
            key.clone(),
            MergedEntry {
                description: description.clone(),
                origin: Origin::Configured,
            },
        );
    }

    MergedView { entries }
}

/// What changed when the imported set was replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportDiff {
    /// Keys not present in the previous import
    pub added: usize,
    /// Keys of the previous import that are gone
    pub removed: usize,
    /// Keys kept with a different description
    pub changed: usize,
    /// Size of the new import
    pub total: usize,
}

impl ImportDiff {
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.changed == 0
    }

    fn between(old: &ShortcutMap, new: &ShortcutMap) -> Self {
        let mut diff = ImportDiff {
            total: new.len(),
            ..Default::default()
        };
        for (key, description) in new {
            match old.get(key) {
                None => diff.added += 1,
                Some(previous) if previous != description => diff.changed += 1,
                Some(_) => {}
            }
        }
        diff.removed = old.keys().filter(|k| !new.contains_key(*k)).count();
        diff
    }
}

/// Owns the imported and configured shortcut sets.
///
/// The configured set is fixed for the lifetime of the registry; the
/// imported set can be swapped out wholesale by a new import.
#[derive(Debug, Clone, Default)]
pub struct ShortcutRegistry {
    imported: ShortcutMap,
    configured: ShortcutMap,
    merged: MergedView,
}

impl ShortcutRegistry {
    pub fn new(imported: ShortcutMap, configured: ShortcutMap) -> Self {
        let merged = merge(&imported, &configured);
        Self {
            imported,
            configured,
            merged,
        }
    }

    /// Replace the whole imported set.
    ///
    /// Nothing from the previous import survives; keys it had that the new
    /// one lacks disappear from the merged view unless they are configured.
    pub fn replace_imported(&mut self, imported: ShortcutMap) -> ImportDiff {
        let diff = ImportDiff::between(&self.imported, &imported);
        self.imported = imported;
        self.merged = merge(&self.imported, &self.configured);

        tracing::debug!(
            "Replaced imported shortcuts: {} total, {} added, {} removed, {} changed",
            diff.total,
            diff.added,
            diff.removed,
            diff.changed
        );

        diff
    }

    /// Look up a key in the merged view.
    pub fn get(&self, key: &str) -> Option<&MergedEntry> {
        self.merged.get(key)
    }

    pub fn merged(&self) -> &MergedView {
        &self.merged
    }

    pub fn imported(&self) -> &ShortcutMap {
        &self.imported
    }

    pub fn configured(&self) -> &ShortcutMap {
        &self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> ShortcutMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_configured_wins_on_collision() {
        let imported = map(&[("Super+Up", "Maximize"), ("Super+Down", "Unmaximize")]);
        let configured = map(&[("Super+Up", "Fill screen")]);

        let merged = merge(&imported, &configured);
        assert_eq!(merged.description("Super+Up"), Some("Fill screen"));
        assert!(merged.is_configured("Super+Up"));
        assert_eq!(merged.description("Super+Down"), Some("Unmaximize"));
        assert!(!merged.is_configured("Super+Down"));
    }

    #[test]
    fn test_merge_keeps_every_key() {
        let imported = map(&[("A", "1"), ("B", "2")]);
        let configured = map(&[("B", "3"), ("Ctrl+C", "Copy")]);

        let merged = merge(&imported, &configured);
        assert_eq!(merged.len(), 3);
        for key in imported.keys().chain(configured.keys()) {
            assert!(merged.contains_key(key), "missing {}", key);
        }
        for (key, description) in &configured {
            assert_eq!(merged.description(key), Some(description.as_str()));
        }
    }

    #[test]
    fn test_merge_of_empty_maps() {
        assert!(merge(&ShortcutMap::new(), &ShortcutMap::new()).is_empty());
    }

    #[test]
    fn test_replace_imported_drops_stale_entries() {
        let mut registry = ShortcutRegistry::new(
            map(&[("Super+A", "Old A"), ("Super+Shared", "Old shared"), ("Super+Kept", "Imported")]),
            map(&[("Super+Kept", "Configured")]),
        );

        let diff = registry.replace_imported(map(&[("Super+B", "New B"), ("Super+Shared", "New shared")]));

        assert!(registry.get("Super+A").is_none());
        assert_eq!(registry.get("Super+B").map(|e| e.description.as_str()), Some("New B"));
        assert_eq!(
            registry.get("Super+Shared").map(|e| e.description.as_str()),
            Some("New shared")
        );
        // Configured key survives even though the new import lacks it
        assert_eq!(
            registry.get("Super+Kept").map(|e| e.origin),
            Some(Origin::Configured)
        );
        assert_eq!(
            diff,
            ImportDiff {
                added: 1,
                removed: 2,
                changed: 1,
                total: 2,
            }
        );
    }

    #[test]
    fn test_replace_with_same_import_is_unchanged() {
        let imported = map(&[("Super+A", "A")]);
        let mut registry = ShortcutRegistry::new(imported.clone(), ShortcutMap::new());

        assert!(registry.replace_imported(imported).is_unchanged());
    }
}
