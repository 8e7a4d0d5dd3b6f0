//! Configuration data model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Layout version written by this build.
///
/// - `0`: the legacy JSON file (`config.json`)
/// - `1`: KDL with user shortcuts under `shortcuts`
/// - `2`: KDL with user shortcuts under `configured-shortcuts`
pub const CURRENT_VERSION: u32 = 2;

/// Canonical shortcut key -> description (or alias -> target key).
pub type ShortcutMap = HashMap<String, String>;

/// Root configuration structure, always at [`CURRENT_VERSION`] once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub global: GlobalConfig,
    pub import_sources: ImportSources,
    pub popup: PopupSettings,
    /// Shortcuts authored by the user; these win over imported ones.
    pub configured_shortcuts: ShortcutMap,
    /// Shortcuts harvested from the desktop environment. Replaced wholesale
    /// on every import.
    pub imported_shortcuts: ShortcutMap,
    /// Alias key -> canonical key whose description it borrows.
    pub key_aliases: ShortcutMap,
}

/// Global settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Which desktop settings sources an import reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportSources {
    pub window_manager: bool,
    pub media_keys: bool,
    pub shell: bool,
}

impl Default for ImportSources {
    fn default() -> Self {
        Self {
            window_manager: true,
            media_keys: true,
            shell: true,
        }
    }
}

impl ImportSources {
    /// Import is skipped entirely when every source is switched off.
    pub fn any_enabled(&self) -> bool {
        self.window_manager || self.media_keys || self.shell
    }
}

/// Presentation settings handed through to the overlay renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopupSettings {
    /// Auto-hide delay for peek mode, in milliseconds
    pub timeout_ms: u64,
    pub opacity: f64,
    /// Minimum overlay width in pixels
    pub width: u32,
    /// Distance from the screen corner in pixels
    pub margin: u32,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            opacity: 0.95,
            width: 600,
            margin: 20,
        }
    }
}
