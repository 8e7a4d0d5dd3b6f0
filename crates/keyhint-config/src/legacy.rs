//! Loader for the JSON configuration used before the KDL format

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::migrate::{migrate, VersionedConfig};
use crate::model::{Config, GlobalConfig, ImportSources, PopupSettings, ShortcutMap};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyConfig {
    shortcuts: Option<ShortcutMap>,
    configured_shortcuts: Option<ShortcutMap>,
    imported_shortcuts: ShortcutMap,
    key_aliases: ShortcutMap,
    import_sources: ImportSources,
    popup_settings: LegacyPopupSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyPopupSettings {
    timeout: Option<u64>,
    opacity: Option<f64>,
}

impl From<LegacyConfig> for VersionedConfig {
    fn from(legacy: LegacyConfig) -> Self {
        let defaults = PopupSettings::default();
        let popup = PopupSettings {
            timeout_ms: legacy
                .popup_settings
                .timeout
                .filter(|t| *t > 0)
                .unwrap_or(defaults.timeout_ms),
            opacity: legacy
                .popup_settings
                .opacity
                .map(|o| o.clamp(0.0, 1.0))
                .unwrap_or(defaults.opacity),
            ..defaults
        };

        VersionedConfig {
            version: 0,
            config: Config {
                global: GlobalConfig::default(),
                import_sources: legacy.import_sources,
                popup,
                configured_shortcuts: ShortcutMap::new(),
                imported_shortcuts: legacy.imported_shortcuts,
                key_aliases: legacy.key_aliases,
            },
            configured: legacy.configured_shortcuts,
            legacy_shortcuts: legacy.shortcuts,
        }
    }
}

/// Read a legacy `config.json` and migrate it to the current model.
pub fn load_legacy_json(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    parse_legacy_json(&content)
}

fn parse_legacy_json(content: &str) -> Result<Config, ConfigError> {
    let legacy: LegacyConfig = serde_json::from_str(content)?;
    migrate(legacy.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_shortcuts_key_migrated() {
        let json = r#"{
            "shortcuts": { "Ctrl+C": "Copy" },
            "imported_shortcuts": { "Super+Up": "Maximize" },
            "key_aliases": { "Shift+Delete": "Ctrl+X" },
            "popup_settings": { "timeout": 5000, "opacity": 0.9, "position": "bottom-right" }
        }"#;

        let config = parse_legacy_json(json).unwrap();
        assert_eq!(config.configured_shortcuts["Ctrl+C"], "Copy");
        assert_eq!(config.imported_shortcuts["Super+Up"], "Maximize");
        assert_eq!(config.key_aliases["Shift+Delete"], "Ctrl+X");
        assert_eq!(config.popup.timeout_ms, 5000);
        assert_eq!(config.popup.opacity, 0.9);
        assert_eq!(config.popup.width, PopupSettings::default().width);
    }

    #[test]
    fn test_configured_shortcuts_key_preferred() {
        let json = r#"{
            "shortcuts": { "Ctrl+C": "Copy" },
            "configured_shortcuts": { "Ctrl+V": "Paste" }
        }"#;

        let config = parse_legacy_json(json).unwrap();
        assert_eq!(config.configured_shortcuts.len(), 1);
        assert_eq!(config.configured_shortcuts["Ctrl+V"], "Paste");
    }

    #[test]
    fn test_partial_import_sources_default_to_enabled() {
        let json = r#"{ "import_sources": { "media_keys": false } }"#;

        let config = parse_legacy_json(json).unwrap();
        assert!(config.import_sources.window_manager);
        assert!(!config.import_sources.media_keys);
        assert!(config.import_sources.shell);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            parse_legacy_json("{ \"shortcuts\": "),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_missing_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_legacy_json(&dir.path().join("config.json")).unwrap_err();
        assert!(err.is_missing());
    }
}
