//! KDL configuration parser

use std::path::Path;

use crate::error::ConfigError;
use crate::migrate::{migrate, VersionedConfig};
use crate::model::*;

/// Version assumed for KDL files that predate the `version` node.
const UNVERSIONED_KDL: u32 = 1;

/// Line number (1-indexed) of a node, for error messages
fn line_of(node: &kdl::KdlNode, source: &str) -> usize {
    let offset = node.name().span().offset();
    source
        .char_indices()
        .take_while(|(i, _)| *i < offset)
        .filter(|(_, ch)| *ch == '\n')
        .count()
        + 1
}

fn invalid(node: &kdl::KdlNode, source: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        message: format!("line {}: {}", line_of(node, source), message),
    }
}

/// Load, parse and migrate the configuration file at `path`.
///
/// A file that does not exist is reported as [`ConfigError::Missing`] so the
/// caller can tell it apart from a file that exists but is broken.
pub fn load_configuration(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    parse_config_str(&content)
}

/// Parse and migrate configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    migrate(parse_document(content)?)
}

/// Parse KDL text, keeping the source for diagnostics
pub(crate) fn parse_kdl(content: &str) -> Result<kdl::KdlDocument, ConfigError> {
    content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })
}

/// Parse configuration from a string without migrating it
pub fn parse_document(content: &str) -> Result<VersionedConfig, ConfigError> {
    let doc = parse_kdl(content)?;

    let mut versioned = VersionedConfig {
        version: UNVERSIONED_KDL,
        ..Default::default()
    };

    for node in doc.nodes() {
        match node.name().value() {
            "version" => {
                versioned.version = parse_version(node, content)?;
            }
            "global" => {
                versioned.config.global = parse_global(node, content)?;
            }
            "import-sources" => {
                versioned.config.import_sources = parse_import_sources(node, content)?;
            }
            "popup" => {
                versioned.config.popup = parse_popup(node, content)?;
            }
            "configured-shortcuts" => {
                versioned.configured = Some(parse_shortcut_block(node, content)?);
            }
            "shortcuts" => {
                versioned.legacy_shortcuts = Some(parse_shortcut_block(node, content)?);
            }
            "imported-shortcuts" => {
                versioned.config.imported_shortcuts = parse_shortcut_block(node, content)?;
            }
            "key-aliases" => {
                versioned.config.key_aliases = parse_shortcut_block(node, content)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(versioned)
}

fn parse_version(node: &kdl::KdlNode, source: &str) -> Result<u32, ConfigError> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_i64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| invalid(node, source, "`version` expects a non-negative integer"))
}

fn parse_global(node: &kdl::KdlNode, source: &str) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = child.entries().first().and_then(|e| e.value().as_string()) {
                        global.log_level = val.parse().map_err(|e| invalid(child, source, e))?;
                    }
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_bool(node: &kdl::KdlNode, source: &str) -> Result<bool, ConfigError> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_bool())
        .ok_or_else(|| {
            invalid(
                node,
                source,
                format!("`{}` expects true or false", node.name().value()),
            )
        })
}

fn parse_import_sources(node: &kdl::KdlNode, source: &str) -> Result<ImportSources, ConfigError> {
    let mut sources = ImportSources::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "window-manager" => sources.window_manager = parse_bool(child, source)?,
                "media-keys" => sources.media_keys = parse_bool(child, source)?,
                "shell" => sources.shell = parse_bool(child, source)?,
                name => {
                    tracing::warn!("Unknown import source: {}", name);
                }
            }
        }
    }

    Ok(sources)
}

fn parse_unsigned(node: &kdl::KdlNode, source: &str) -> Result<u64, ConfigError> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_i64())
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| {
            invalid(
                node,
                source,
                format!("`{}` expects a non-negative integer", node.name().value()),
            )
        })
}

fn parse_popup(node: &kdl::KdlNode, source: &str) -> Result<PopupSettings, ConfigError> {
    let mut popup = PopupSettings::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "timeout" => {
                    let timeout = parse_unsigned(child, source)?;
                    if timeout == 0 {
                        return Err(invalid(child, source, "`timeout` must be greater than zero"));
                    }
                    popup.timeout_ms = timeout;
                }
                "opacity" => {
                    let opacity = child
                        .entries()
                        .first()
                        .and_then(|e| {
                            let value = e.value();
                            value.as_f64().or_else(|| value.as_i64().map(|v| v as f64))
                        })
                        .ok_or_else(|| invalid(child, source, "`opacity` expects a number"))?;
                    if !(0.0..=1.0).contains(&opacity) {
                        return Err(invalid(
                            child,
                            source,
                            format!("`opacity` must be between 0.0 and 1.0, got {}", opacity),
                        ));
                    }
                    popup.opacity = opacity;
                }
                "width" => {
                    popup.width = u32::try_from(parse_unsigned(child, source)?)
                        .map_err(|_| invalid(child, source, "`width` is too large"))?;
                }
                "margin" => {
                    popup.margin = u32::try_from(parse_unsigned(child, source)?)
                        .map_err(|_| invalid(child, source, "`margin` is too large"))?;
                }
                name => {
                    tracing::warn!("Unknown popup option: {}", name);
                }
            }
        }
    }

    Ok(popup)
}

/// Parse a block of `"key" "value"` children into a map
fn parse_shortcut_block(node: &kdl::KdlNode, source: &str) -> Result<ShortcutMap, ConfigError> {
    let mut map = ShortcutMap::new();
    let block = node.name().value();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().trim();
            if key.is_empty() {
                return Err(invalid(child, source, format!("empty key in `{}`", block)));
            }

            let value = child
                .entries()
                .first()
                .and_then(|e| e.value().as_string())
                .ok_or_else(|| {
                    invalid(
                        child,
                        source,
                        format!("`{}` in `{}` expects a string value", key, block),
                    )
                })?;

            if map.insert(key.to_string(), value.to_string()).is_some() {
                tracing::warn!("Duplicate key '{}' in `{}`, keeping the last one", key, block);
            }
        }
    }

    Ok(map)
}
