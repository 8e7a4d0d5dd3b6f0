//! Modifier state tracking
//!
//! The overlay reacts to four logical modifiers. Each follows the same
//! two-state machine:
//!
//! ```text
//!  ┌──────────┐   press    ┌──────┐
//!  │ Released │ ─────────► │ Held │
//!  └──────────┘ ◄───────── └──────┘
//!                release
//! ```
//!
//! Presses while held and releases while released change nothing and are not
//! reported.
//!
//! ## Left/right collapse
//!
//! Left and right variants map to one logical flag and there is no press
//! count. Pressing both Ctrl keys and releasing one clears `Ctrl` even though
//! the other is still down. This matches the overlay's historical behaviour
//! and is kept on purpose.
//!
//! ## Visibility
//!
//! Ctrl, Super and Alt are *qualifying* modifiers. The overlay is shown when
//! the first qualifying modifier goes down and hidden when the last one comes
//! up. Shift never shows or hides it; it only changes what is listed.

use std::fmt;

use serde::{Serialize, Serializer};

/// Logical modifier, in overlay display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Super,
    Alt,
    Shift,
}

impl Modifier {
    /// All modifiers in display order.
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Super, Modifier::Alt, Modifier::Shift];

    fn index(self) -> usize {
        match self {
            Modifier::Ctrl => 0,
            Modifier::Super => 1,
            Modifier::Alt => 2,
            Modifier::Shift => 3,
        }
    }

    /// Whether holding this modifier alone makes the overlay visible.
    pub fn is_qualifying(self) -> bool {
        !matches!(self, Modifier::Shift)
    }

    /// Upper-case label used in overlay captions.
    pub fn label(self) -> &'static str {
        match self {
            Modifier::Ctrl => "CTRL",
            Modifier::Super => "SUPER",
            Modifier::Alt => "ALT",
            Modifier::Shift => "SHIFT",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Ctrl => write!(f, "Ctrl"),
            Modifier::Super => write!(f, "Super"),
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Shift => write!(f, "Shift"),
        }
    }
}

/// Physical modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
}

impl ModifierKey {
    /// The logical modifier this key drives.
    pub fn modifier(self) -> Modifier {
        match self {
            ModifierKey::LeftCtrl | ModifierKey::RightCtrl => Modifier::Ctrl,
            ModifierKey::LeftShift | ModifierKey::RightShift => Modifier::Shift,
            ModifierKey::LeftAlt | ModifierKey::RightAlt => Modifier::Alt,
            ModifierKey::LeftSuper | ModifierKey::RightSuper => Modifier::Super,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// A press or release of a physical modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierEvent {
    pub key: ModifierKey,
    pub action: KeyAction,
}

impl ModifierEvent {
    pub fn press(key: ModifierKey) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    pub fn release(key: ModifierKey) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }
}

/// Which logical modifiers are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    held: [bool; 4],
}

impl ModifierState {
    /// A state with the given modifiers held.
    pub fn with_held(modifiers: &[Modifier]) -> Self {
        let mut state = Self::default();
        for &modifier in modifiers {
            state.held[modifier.index()] = true;
        }
        state
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        self.held[modifier.index()]
    }

    /// Held modifiers in display order (Ctrl, Super, Alt, Shift).
    pub fn held(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.is_held(*m))
    }

    /// True when at least one of Ctrl, Super or Alt is held.
    pub fn any_qualifying(&self) -> bool {
        self.held().any(Modifier::is_qualifying)
    }

    pub fn is_empty(&self) -> bool {
        !self.held.iter().any(|h| *h)
    }

    /// Set a flag, returning whether its value changed.
    fn set(&mut self, modifier: Modifier, held: bool) -> bool {
        let slot = &mut self.held[modifier.index()];
        let changed = *slot != held;
        *slot = held;
        changed
    }
}

impl Serialize for ModifierState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.held())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Show,
    Hide,
}

/// Emitted whenever a modifier flag changes value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierChanged {
    pub state: ModifierState,
    /// Set when the change crosses the qualifying-modifier threshold
    pub visibility: Option<Visibility>,
}

/// Tracks held modifiers from raw press/release events.
#[derive(Debug, Clone, Default)]
pub struct ModifierTracker {
    state: ModifierState,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ModifierState {
        self.state
    }

    /// Apply one event. Returns `None` when it did not change any flag.
    pub fn handle(&mut self, event: ModifierEvent) -> Option<ModifierChanged> {
        let modifier = event.key.modifier();
        let was_visible = self.state.any_qualifying();

        if !self.state.set(modifier, event.action == KeyAction::Press) {
            return None;
        }

        let visibility = match (was_visible, self.state.any_qualifying()) {
            (false, true) => Some(Visibility::Show),
            (true, false) => Some(Visibility::Hide),
            _ => None,
        };

        tracing::debug!(
            "{} {:?}: held [{}]",
            modifier,
            event.action,
            self.state
                .held()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Some(ModifierChanged {
            state: self.state,
            visibility,
        })
    }
}
