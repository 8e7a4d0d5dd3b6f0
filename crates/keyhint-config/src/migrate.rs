//! One-time upgrade of older configuration layouts
//!
//! Older files kept the user's shortcuts under `shortcuts`. The parser and
//! the legacy JSON loader both produce a [`VersionedConfig`] that still
//! remembers which block the shortcuts came from; [`migrate`] folds that into
//! a current [`Config`] so nothing downstream ever looks at the old name.

use crate::error::ConfigError;
use crate::model::{Config, ShortcutMap, CURRENT_VERSION};

/// A configuration as it was read, before migration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedConfig {
    /// Layout version declared by the file (`1` when a KDL file has no
    /// `version` node, `0` for legacy JSON)
    pub version: u32,
    /// Everything except the user shortcuts
    pub config: Config,
    /// The `configured-shortcuts` block, if present
    pub configured: Option<ShortcutMap>,
    /// The pre-version-2 `shortcuts` block, if present
    pub legacy_shortcuts: Option<ShortcutMap>,
}

/// Upgrade a freshly read configuration to [`CURRENT_VERSION`].
pub fn migrate(doc: VersionedConfig) -> Result<Config, ConfigError> {
    let VersionedConfig {
        version,
        mut config,
        configured,
        legacy_shortcuts,
    } = doc;

    if version > CURRENT_VERSION {
        return Err(ConfigError::Invalid {
            message: format!(
                "configuration version {} is newer than supported version {}",
                version, CURRENT_VERSION
            ),
        });
    }

    config.configured_shortcuts = match (configured, legacy_shortcuts) {
        (Some(configured), Some(legacy)) => {
            tracing::warn!(
                "Both `configured-shortcuts` and legacy `shortcuts` present; ignoring {} legacy shortcut(s)",
                legacy.len()
            );
            configured
        }
        (Some(configured), None) => configured,
        (None, Some(legacy)) => {
            tracing::info!(
                "Moved {} shortcut(s) from legacy `shortcuts` to `configured-shortcuts`",
                legacy.len()
            );
            legacy
        }
        (None, None) => ShortcutMap::new(),
    };

    if version < CURRENT_VERSION {
        tracing::info!(
            "Upgraded configuration from version {} to {}",
            version,
            CURRENT_VERSION
        );
    }

    Ok(config)
}
