//! Write the configuration back as KDL

use std::fmt::Write as _;
use std::path::Path;

use crate::error::ConfigError;
use crate::model::{Config, ShortcutMap, CURRENT_VERSION};
use crate::parser::{parse_document, parse_kdl};

const IMPORTED_NODE: &str = "imported-shortcuts";

/// Quote a string using KDL escaping rules.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn push_shortcut_block(output: &mut String, name: &str, map: &ShortcutMap) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort();

    output.push_str(name);
    output.push_str(" {\n");
    for (key, value) in entries {
        let _ = writeln!(output, "    {} {}", quote(key), quote(value));
    }
    output.push_str("}\n");
}

/// Render a configuration in the current layout.
///
/// Keys are sorted so that saving an unchanged configuration produces an
/// identical file.
pub fn render_config(config: &Config) -> String {
    let mut output = String::new();

    output.push_str("// keyhint configuration\n");
    output.push_str("// `imported-shortcuts` is rewritten on every system import.\n\n");

    let _ = writeln!(output, "version {}\n", CURRENT_VERSION);

    output.push_str("global {\n");
    let _ = writeln!(
        output,
        "    log-level {}",
        quote(config.global.log_level.as_filter())
    );
    output.push_str("}\n\n");

    let sources = &config.import_sources;
    output.push_str("import-sources {\n");
    let _ = writeln!(output, "    window-manager {}", sources.window_manager);
    let _ = writeln!(output, "    media-keys {}", sources.media_keys);
    let _ = writeln!(output, "    shell {}", sources.shell);
    output.push_str("}\n\n");

    let popup = &config.popup;
    output.push_str("popup {\n");
    let _ = writeln!(output, "    timeout {}", popup.timeout_ms);
    let _ = writeln!(output, "    opacity {:?}", popup.opacity);
    let _ = writeln!(output, "    width {}", popup.width);
    let _ = writeln!(output, "    margin {}", popup.margin);
    output.push_str("}\n\n");

    push_shortcut_block(&mut output, "configured-shortcuts", &config.configured_shortcuts);
    output.push('\n');
    push_shortcut_block(&mut output, "key-aliases", &config.key_aliases);
    output.push('\n');
    push_shortcut_block(&mut output, IMPORTED_NODE, &config.imported_shortcuts);

    output
}

/// Validate that the rendered KDL can be parsed back by kdl-rs.
///
/// This ensures we never write invalid KDL to the output file.
fn validate_kdl(content: &str) -> Result<(), ConfigError> {
    content.parse::<kdl::KdlDocument>().map_err(|e| ConfigError::Invalid {
        message: format!(
            "Rendered KDL is invalid (this is a bug in keyhint): {}",
            e
        ),
    })?;
    Ok(())
}

/// Write the configuration to `path` using an atomic write.
pub fn save_configuration(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = render_config(config);

    validate_kdl(&content)?;
    write_atomic(path, &content)?;

    tracing::info!("Wrote configuration to {}", path.display());

    Ok(())
}

/// Persist the imported shortcuts without touching the rest of the file.
///
/// Only the `imported-shortcuts` node is replaced; comments, formatting and
/// nodes keyhint does not understand are kept as they are. When the file
/// does not exist yet the whole configuration is rendered instead.
pub fn save_imported_shortcuts(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return save_configuration(config, path);
        }
        Err(e) => return Err(e.into()),
    };

    let content = splice_imported_shortcuts(&existing, &config.imported_shortcuts)?;
    write_atomic(path, &content)?;

    tracing::info!(
        "Updated {} shortcut(s) in {}",
        config.imported_shortcuts.len(),
        path.display()
    );

    Ok(())
}

/// Replace the `imported-shortcuts` node of an existing document.
fn splice_imported_shortcuts(
    existing: &str,
    imported: &ShortcutMap,
) -> Result<String, ConfigError> {
    let mut doc = parse_kdl(existing)?;

    let mut block = String::new();
    push_shortcut_block(&mut block, IMPORTED_NODE, imported);
    let mut replacement = parse_kdl(&block)?
        .nodes()
        .first()
        .cloned()
        .ok_or_else(|| ConfigError::Invalid {
            message: "rendered import block is empty (this is a bug in keyhint)".to_string(),
        })?;

    let nodes = doc.nodes_mut();
    let positions: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.name().value() == IMPORTED_NODE)
        .map(|(i, _)| i)
        .collect();

    match positions.split_first() {
        Some((&first, duplicates)) => {
            if let Some(leading) = nodes[first].leading() {
                replacement.set_leading(leading);
            }
            nodes[first] = replacement;
            for &i in duplicates.iter().rev() {
                nodes.remove(i);
            }
        }
        None => {
            replacement.set_leading("\n");
            nodes.push(replacement);
        }
    }

    let content = doc.to_string();
    parse_document(&content)?;
    Ok(content)
}

/// Write `content` to a temporary file next to `path`, then rename it over
/// the target, so a failed save never leaves a truncated file behind.
fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Temp file must be in same directory for atomic rename to work
    let temp_path = path.with_extension("kdl.tmp");

    if let Err(e) = std::fs::write(&temp_path, content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}
