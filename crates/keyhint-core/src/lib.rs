//! Shortcut engine for keyhint
//!
//! Everything in this crate is pure, in-memory computation:
//!
//! - [`normalizer`] turns desktop keybinding strings (`<Control><Shift>Left`)
//!   into canonical shortcut keys
//! - [`registry`] holds imported and user-configured shortcuts and merges
//!   them, configured entries winning
//! - [`modifiers`] tracks which modifier keys are held and reports show/hide
//!   transitions
//! - [`filter`] selects and orders the shortcuts that apply to the held
//!   modifiers

pub mod filter;
pub mod modifiers;
pub mod normalizer;
pub mod registry;

pub use filter::{filter, filter_with_prefix, overview, FilterEntry, FilterResult, BASE_CAPTION};
pub use modifiers::{
    KeyAction, Modifier, ModifierChanged, ModifierEvent, ModifierKey, ModifierState,
    ModifierTracker, Visibility,
};
pub use normalizer::{collect_shortcuts, is_importable, normalize, RawBinding};
pub use registry::{merge, ImportDiff, MergedEntry, MergedView, Origin, ShortcutMap, ShortcutRegistry};
