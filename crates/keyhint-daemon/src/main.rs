//! keyhint daemon
//!
//! Watches keyboards for held modifiers and pushes the matching shortcuts to
//! an overlay.

mod autohide;
mod capture;
mod device;
mod display;
mod importer;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use keyhint_config::Config;
use keyhint_core::ShortcutRegistry;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::display::{DisplayGateway, JsonLinesDisplay, LogDisplay};
use crate::importer::BindingSource;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "keyhintd")]
#[command(about = "Shortcut overlay daemon driven by held modifier keys")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keyhint/config.kdl")]
    config: String,

    /// Skip importing shortcuts from the desktop on start
    #[arg(long)]
    no_import_system: bool,

    /// Import shortcuts from the desktop, save them and exit
    #[arg(long, conflicts_with = "no_import_system")]
    import_only: bool,

    /// Where overlay updates go
    #[arg(long, value_enum, default_value_t = DisplayKind::Log)]
    display: DisplayKind,

    /// Show every shortcut once at start, hiding after the popup timeout
    #[arg(long)]
    peek: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DisplayKind {
    /// Log overlay contents
    Log,
    /// JSON lines on stdout for an external renderer
    Json,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn init_tracing() -> (FilterHandle, bool) {
    let from_env = EnvFilter::try_from_default_env().ok();
    let overridden = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    (handle, overridden)
}

fn load_config(path: &Path, import_only: bool) -> Result<Config> {
    match keyhint_config::load_configuration(path) {
        Ok(config) => Ok(config),
        Err(e) if e.is_missing() && import_only => {
            tracing::info!("{}, starting from an empty configuration", e);
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Replace the imported shortcuts with what the desktop currently has and
/// persist them if anything changed.
///
/// When no source could be read the previously imported set is kept and
/// nothing is written.
async fn import_system(
    sources: &[Box<dyn BindingSource>],
    config: &mut Config,
    registry: &mut ShortcutRegistry,
    config_path: &Path,
    force_save: bool,
) -> Result<()> {
    let report = importer::import_system_shortcuts(sources, &config.import_sources).await;

    if report.all_failed() {
        if force_save {
            bail!(
                "none of the {} enabled import source(s) could be read",
                report.attempted
            );
        }
        tracing::warn!(
            "No import source could be read, keeping {} previously imported shortcut(s)",
            registry.imported().len()
        );
        return Ok(());
    }

    let diff = registry.replace_imported(report.shortcuts.clone());
    config.imported_shortcuts = report.shortcuts;
    tracing::info!(
        "Imported {} shortcut(s): {} added, {} removed, {} changed ({} source(s) failed)",
        diff.total,
        diff.added,
        diff.removed,
        diff.changed,
        report.failures.len()
    );

    if diff.is_unchanged() && !force_save {
        return Ok(());
    }

    keyhint_config::save_imported_shortcuts(config, config_path)
        .with_context(|| format!("Failed to save {}", config_path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let (filter_handle, env_overridden) = init_tracing();

    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    tracing::info!("Loading configuration from {}", config_path.display());
    let mut config = load_config(&config_path, args.import_only)?;

    if !env_overridden {
        let level = config.global.log_level.as_filter();
        if let Err(e) = filter_handle.reload(EnvFilter::new(level)) {
            tracing::warn!("Could not apply log level '{}': {}", level, e);
        }
    }

    tracing::info!(
        "Loaded {} configured shortcut(s), {} imported, {} alias(es)",
        config.configured_shortcuts.len(),
        config.imported_shortcuts.len(),
        config.key_aliases.len()
    );

    let mut registry = ShortcutRegistry::new(
        config.imported_shortcuts.clone(),
        config.configured_shortcuts.clone(),
    );

    let sources = importer::system_sources();

    if args.import_only {
        return import_system(&sources, &mut config, &mut registry, &config_path, true).await;
    }

    if !args.no_import_system && config.import_sources.any_enabled() {
        if let Err(e) =
            import_system(&sources, &mut config, &mut registry, &config_path, false).await
        {
            tracing::warn!("{:#}", e);
        }
    }

    let keyboards = device::open_keyboards()?;
    let streams = capture::event_streams(keyboards)?;
    tracing::info!("Watching {} keyboard(s)", streams.len());

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (peek_tx, peek_rx) = mpsc::unbounded_channel();
    let capture = capture::spawn_capture(streams, event_tx);

    let mut usr1 = signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
    let signal_peek = peek_tx.clone();
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            tracing::debug!("SIGUSR1 received");
            if signal_peek.send(()).is_err() {
                break;
            }
        }
    });

    if args.peek {
        // The session is not running yet; the request waits in the channel
        let _ = peek_tx.send(());
    }
    drop(peek_tx);

    let display: Box<dyn DisplayGateway + Send> = match args.display {
        DisplayKind::Log => Box::new(LogDisplay::default()),
        DisplayKind::Json => Box::new(JsonLinesDisplay::new(std::io::stdout(), config.popup)),
    };
    let session = Session::new(
        registry,
        config.key_aliases,
        Duration::from_millis(config.popup.timeout_ms),
        display,
    );

    tracing::info!("keyhintd running, hold Ctrl, Super or Alt to show shortcuts");

    tokio::select! {
        _ = session.run(event_rx, peek_rx) => {
            tracing::warn!("Input capture ended");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            tracing::info!("Shutting down");
        }
    }

    capture.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::fake::{boxed, FailingSource, StaticSource};
    use crate::importer::ImportSource;

    const CONFIG: &str = r#"// hand edited
version 2
configured-shortcuts {
    "Ctrl+C" "Copy"
}
imported-shortcuts {
    "Super+D" "Show Desktop"
}
"#;

    fn setup() -> (tempfile::TempDir, PathBuf, Config, ShortcutRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, CONFIG).unwrap();
        let config = keyhint_config::load_configuration(&path).unwrap();
        let registry = ShortcutRegistry::new(
            config.imported_shortcuts.clone(),
            config.configured_shortcuts.clone(),
        );
        (dir, path, config, registry)
    }

    fn all_failing() -> Vec<Box<dyn BindingSource>> {
        ImportSource::ALL
            .into_iter()
            .map(|s| boxed(FailingSource(s)))
            .collect()
    }

    #[tokio::test]
    async fn test_failed_import_keeps_previous_shortcuts() {
        let (_dir, path, mut config, mut registry) = setup();

        import_system(&all_failing(), &mut config, &mut registry, &path, false)
            .await
            .unwrap();

        assert_eq!(
            registry.get("Super+D").map(|e| e.description.as_str()),
            Some("Show Desktop")
        );
        assert_eq!(config.imported_shortcuts.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG);
    }

    #[tokio::test]
    async fn test_failed_import_only_is_an_error() {
        let (_dir, path, mut config, mut registry) = setup();

        let result = import_system(&all_failing(), &mut config, &mut registry, &path, true).await;

        assert!(result.is_err());
        assert_eq!(registry.imported().len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG);
    }

    #[tokio::test]
    async fn test_partial_import_replaces_and_saves() {
        let (_dir, path, mut config, mut registry) = setup();
        let sources = vec![
            boxed(StaticSource {
                source: ImportSource::WindowManager,
                bindings: vec![("lock-screen", "<Super>l")],
            }),
            boxed(FailingSource(ImportSource::Shell)),
        ];

        import_system(&sources, &mut config, &mut registry, &path, false)
            .await
            .unwrap();

        assert!(registry.get("Super+D").is_none());
        assert!(registry.get("Super+L").is_some());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("// hand edited"));
        let reloaded = keyhint_config::load_configuration(&path).unwrap();
        assert_eq!(reloaded.imported_shortcuts, config.imported_shortcuts);
        assert_eq!(reloaded.configured_shortcuts["Ctrl+C"], "Copy");
    }
}
