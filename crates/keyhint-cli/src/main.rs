//! keyhint CLI
//!
//! Inspection and configuration tool for keyhint.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keyhint_config::Config;
use keyhint_core::{filter, overview, FilterResult, Modifier, ModifierState, ShortcutRegistry};
use miette::IntoDiagnostic;
use nix::unistd::{access, AccessFlags};

#[derive(Parser, Debug)]
#[command(name = "keyhint")]
#[command(about = "Shortcut overlay driven by held modifier keys")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keyhint/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// List keyboards and whether they can be read
    Devices,

    /// List every known shortcut, configured ones first
    List,

    /// Show what the overlay would contain for a set of held modifiers
    Preview {
        #[arg(long)]
        ctrl: bool,
        #[arg(long = "super")]
        super_key: bool,
        #[arg(long)]
        alt: bool,
        #[arg(long)]
        shift: bool,
    },

    /// Convert a legacy config.json into the KDL format
    Migrate {
        /// Legacy JSON configuration
        input: PathBuf,

        /// Output path (defaults to --config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite the output if it exists
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate => cmd_validate(&config_path),
        Commands::Devices => cmd_devices(),
        Commands::List => cmd_list(&config_path),
        Commands::Preview {
            ctrl,
            super_key,
            alt,
            shift,
        } => {
            let held: Vec<Modifier> = [
                (ctrl, Modifier::Ctrl),
                (super_key, Modifier::Super),
                (alt, Modifier::Alt),
                (shift, Modifier::Shift),
            ]
            .into_iter()
            .filter_map(|(on, m)| on.then_some(m))
            .collect();
            cmd_preview(&config_path, &ModifierState::with_held(&held))
        }
        Commands::Migrate {
            input,
            output,
            force,
        } => cmd_migrate(&input, output.as_deref().unwrap_or(&config_path), force),
    }
}

fn load(config_path: &Path) -> miette::Result<Config> {
    Ok(keyhint_config::load_configuration(config_path)?)
}

fn registry(config: &Config) -> ShortcutRegistry {
    ShortcutRegistry::new(
        config.imported_shortcuts.clone(),
        config.configured_shortcuts.clone(),
    )
}

fn print_result(result: &FilterResult) {
    println!("{}\n", result.label);

    if result.is_empty() {
        println!("  (no shortcuts)");
        return;
    }

    for entry in &result.priority {
        println!("  {:<30} {}", entry.keycap(), entry.description);
    }
    if result.has_separator() {
        println!("  {}", "-".repeat(40));
    }
    for entry in &result.secondary {
        println!("  {:<30} {}", entry.keycap(), entry.description);
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = load(config_path)?;
    let merged = registry(&config).merged().len();

    println!("Configuration is valid!");
    println!("  Configured shortcuts: {}", config.configured_shortcuts.len());
    println!("  Imported shortcuts: {}", config.imported_shortcuts.len());
    println!("  Key aliases: {}", config.key_aliases.len());
    println!("  Merged total: {}", merged);

    let dangling: Vec<&String> = config
        .key_aliases
        .iter()
        .filter(|(_, target)| {
            !config.configured_shortcuts.contains_key(*target)
                && !config.imported_shortcuts.contains_key(*target)
        })
        .map(|(alias, _)| alias)
        .collect();
    for alias in dangling {
        println!("  warning: alias '{}' points at an unknown shortcut", alias);
    }

    Ok(())
}

fn cmd_devices() -> miette::Result<()> {
    println!("Input devices:\n");

    let mut paths = Vec::new();
    for entry in std::fs::read_dir("/dev/input").into_diagnostic()? {
        let path = entry.into_diagnostic()?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut unreadable = 0;
    for path in paths {
        if access(&path, AccessFlags::R_OK).is_err() {
            println!("  {} [no read access]", path.display());
            unreadable += 1;
            continue;
        }

        match evdev::Device::open(&path) {
            Ok(device) => {
                let is_keyboard = device.supported_events().contains(evdev::EventType::KEY)
                    && device
                        .supported_keys()
                        .map(|keys| keys.contains(evdev::Key::KEY_A))
                        .unwrap_or(false);
                if !is_keyboard {
                    continue;
                }

                println!("  {} [keyboard]", device.name().unwrap_or("Unknown"));
                println!("    Path: {}", path.display());
            }
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    if unreadable > 0 {
        println!(
            "\n{} device(s) are not readable; add your user to the 'input' group",
            unreadable
        );
    }

    Ok(())
}

fn cmd_list(config_path: &Path) -> miette::Result<()> {
    let config = load(config_path)?;
    let registry = registry(&config);
    print_result(&overview(registry.merged(), &config.key_aliases));
    Ok(())
}

fn cmd_preview(config_path: &Path, state: &ModifierState) -> miette::Result<()> {
    let config = load(config_path)?;
    let registry = registry(&config);
    print_result(&filter(registry.merged(), &config.key_aliases, state));
    Ok(())
}

fn cmd_migrate(input: &Path, output: &Path, force: bool) -> miette::Result<()> {
    if output.exists() && !force {
        return Err(miette::miette!(
            "{} already exists, pass --force to overwrite",
            output.display()
        ));
    }

    let config = keyhint_config::load_legacy_json(input)?;
    keyhint_config::save_configuration(&config, output)?;

    println!("Migrated {} to {}", input.display(), output.display());
    println!("  Configured shortcuts: {}", config.configured_shortcuts.len());
    println!("  Imported shortcuts: {}", config.imported_shortcuts.len());
    println!("  Key aliases: {}", config.key_aliases.len());
    Ok(())
}
