//! Import shortcuts from the desktop environment
//!
//! Each [`ImportSource`] is read independently. A source that is missing or
//! fails contributes nothing and is reported; the others still count.

#[cfg(test)]
pub(crate) mod fake;
mod gsettings;

use std::fmt;

use futures::future::{join_all, BoxFuture};
use keyhint_config::ImportSources;
use keyhint_core::{collect_shortcuts, RawBinding, ShortcutMap};
use thiserror::Error;

pub use gsettings::GsettingsSource;

/// Desktop settings category shortcuts are harvested from.
///
/// The declaration order is the merge order: later sources override earlier
/// ones when two bindings normalize to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportSource {
    WindowManager,
    MediaKeys,
    Shell,
}

impl ImportSource {
    pub const ALL: [ImportSource; 3] = [
        ImportSource::WindowManager,
        ImportSource::MediaKeys,
        ImportSource::Shell,
    ];

    /// GSettings schema holding this source's keybindings.
    pub fn schema(self) -> &'static str {
        match self {
            ImportSource::WindowManager => "org.gnome.desktop.wm.keybindings",
            ImportSource::MediaKeys => "org.gnome.settings-daemon.plugins.media-keys",
            ImportSource::Shell => "org.gnome.shell.keybindings",
        }
    }

    pub fn is_enabled(self, flags: &ImportSources) -> bool {
        match self {
            ImportSource::WindowManager => flags.window_manager,
            ImportSource::MediaKeys => flags.media_keys,
            ImportSource::Shell => flags.shell,
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::WindowManager => write!(f, "window-manager"),
            ImportSource::MediaKeys => write!(f, "media-keys"),
            ImportSource::Shell => write!(f, "shell"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings schema {schema} is unavailable: {message}")]
    Unavailable { schema: String, message: String },
}

/// Something that can list raw keybinding strings for one source.
pub trait BindingSource: Send + Sync {
    fn source(&self) -> ImportSource;

    fn read_bindings(&self) -> BoxFuture<'_, Result<Vec<RawBinding>, ImportError>>;
}

/// Outcome of an import across all enabled sources.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub shortcuts: ShortcutMap,
    /// Number of enabled sources that were read
    pub attempted: usize,
    pub failures: Vec<(ImportSource, ImportError)>,
}

impl ImportReport {
    /// True when sources were read and none of them succeeded. An empty
    /// `shortcuts` map then says nothing about the desktop.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failures.len() == self.attempted
    }
}

/// The GSettings-backed sources for every [`ImportSource`].
pub fn system_sources() -> Vec<Box<dyn BindingSource>> {
    ImportSource::ALL
        .into_iter()
        .map(|source| Box::new(GsettingsSource::new(source)) as Box<dyn BindingSource>)
        .collect()
}

/// Read all enabled sources concurrently and run the records through the
/// normalizer.
pub async fn import_system_shortcuts(
    sources: &[Box<dyn BindingSource>],
    flags: &ImportSources,
) -> ImportReport {
    let mut enabled: Vec<&dyn BindingSource> = sources
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| s.source().is_enabled(flags))
        .collect();
    enabled.sort_by_key(|s| s.source());

    let results = join_all(enabled.iter().map(|s| s.read_bindings())).await;

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for (source, result) in enabled.iter().zip(results) {
        match result {
            Ok(bindings) => {
                tracing::debug!("Read {} binding(s) from {}", bindings.len(), source.source());
                records.extend(bindings);
            }
            Err(e) => {
                tracing::warn!("Could not import {} shortcuts: {}", source.source(), e);
                failures.push((source.source(), e));
            }
        }
    }

    ImportReport {
        shortcuts: collect_shortcuts(&records),
        attempted: enabled.len(),
        failures,
    }
}
