//! Keybinding normalization
//!
//! Desktop settings describe shortcuts as angle-bracket modifier tags
//! followed by a key name, e.g. `<Control><Shift>Left` or `<Super>e`. This
//! module converts them into canonical shortcut keys:
//!
//! ```text
//! [Super+][Shift+][Alt+]FinalKey
//! ```
//!
//! Control is the implicit default and is never written, so `<Control>c`
//! and a bare `c` both normalize to `C`. Only bindings rooted on Control or
//! Super are imported (see [`is_importable`]), which is where the two are
//! told apart.

use crate::registry::ShortcutMap;

/// Substrings that mark a binding as Control- or Super-rooted.
const IMPORT_MARKERS: [&str; 6] = ["control", "ctrl", "primary", "super", "mod4", "mod5"];

/// One binding string as read from a desktop settings source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBinding {
    /// Settings key naming the action, e.g. `switch-to-workspace-1`
    pub action: String,
    /// Binding in angle-bracket notation, e.g. `<Super>Home`
    pub binding: String,
}

impl RawBinding {
    pub fn new(action: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            binding: binding.into(),
        }
    }
}

/// Map well-known key names to their canonical spelling.
fn canonical_key_name(lower: &str) -> Option<&'static str> {
    let name = match lower {
        "return" => "Enter",
        "space" => "Space",
        "backspace" => "Backspace",
        "delete" => "Delete",
        "escape" => "Esc",
        "tab" => "Tab",
        "home" => "Home",
        "end" => "End",
        "page_up" => "PageUp",
        "page_down" => "PageDown",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "f1" => "F1",
        "f2" => "F2",
        "f3" => "F3",
        "f4" => "F4",
        "f5" => "F5",
        "f6" => "F6",
        "f7" => "F7",
        "f8" => "F8",
        "f9" => "F9",
        "f10" => "F10",
        "f11" => "F11",
        "f12" => "F12",
        _ => return None,
    };
    Some(name)
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn normalize_key_name(key: &str) -> String {
    let lower = key.to_lowercase();
    if let Some(name) = canonical_key_name(&lower) {
        return name.to_string();
    }
    if key.chars().count() == 1 {
        key.to_uppercase()
    } else {
        capitalize(key)
    }
}

/// Normalize a desktop binding string into a canonical shortcut key.
///
/// Returns `None` for empty input, the `[]` sentinel, and bindings that
/// name no final key once the modifier tags are removed.
///
/// # Examples
///
/// ```
/// use keyhint_core::normalize;
///
/// assert_eq!(normalize("<Control><Shift>c").as_deref(), Some("Shift+C"));
/// assert_eq!(normalize("<Super>Left").as_deref(), Some("Super+Left"));
/// assert_eq!(normalize("<Alt><Shift>Return").as_deref(), Some("Shift+Alt+Enter"));
/// assert_eq!(normalize(""), None);
/// ```
pub fn normalize(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "[]" {
        return None;
    }

    let mut has_super = false;
    let mut has_shift = false;
    let mut has_alt = false;
    let mut key: Option<&str> = None;
    let mut unbracketed = String::new();

    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        unbracketed.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => {
                let tag = &after[..close];
                match tag.to_lowercase().as_str() {
                    // Control is implicit and never written
                    "control" | "ctrl" | "primary" => {}
                    "super" | "mod4" | "mod5" => has_super = true,
                    "shift" => has_shift = true,
                    "alt" => has_alt = true,
                    _ => {
                        key.get_or_insert(tag);
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                // Not a tag; keep the '<' as text
                unbracketed.push('<');
                rest = after;
            }
        }
    }
    unbracketed.push_str(rest);

    let trailing = unbracketed.replace('+', "");
    let key = key.or_else(|| Some(trailing.trim()).filter(|s| !s.is_empty()))?;

    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if has_super {
        parts.push("Super");
    }
    if has_shift {
        parts.push("Shift");
    }
    if has_alt {
        parts.push("Alt");
    }
    let final_key = normalize_key_name(key);
    parts.push(&final_key);

    Some(parts.join("+"))
}

/// True when a raw binding is rooted on Control or Super.
///
/// Only these are surfaced by keyhint; everything else is dropped before
/// normalization.
pub fn is_importable(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    IMPORT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Turn a settings key into a readable description:
/// `switch-to-workspace-1` becomes `Switch To Workspace 1`.
pub fn describe_action(action: &str) -> String {
    let mut out = String::with_capacity(action.len());
    let mut prev_is_letter = false;
    for ch in action.chars() {
        let ch = if ch == '_' || ch == '-' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Run a batch of raw bindings through the import pipeline.
///
/// Bindings that are not Control/Super rooted or that fail to normalize are
/// skipped. Later records win when two normalize to the same key.
pub fn collect_shortcuts<'a, I>(records: I) -> ShortcutMap
where
    I: IntoIterator<Item = &'a RawBinding>,
{
    let mut shortcuts = ShortcutMap::new();

    for record in records {
        if !is_importable(&record.binding) {
            continue;
        }
        match normalize(&record.binding) {
            Some(key) => {
                shortcuts.insert(key, describe_action(&record.action));
            }
            None => {
                tracing::debug!(
                    "Skipping unparseable binding '{}' for {}",
                    record.binding,
                    record.action
                );
            }
        }
    }

    shortcuts
}
