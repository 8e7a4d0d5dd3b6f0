//! GSettings-backed binding source
//!
//! Runs `gsettings list-recursively <schema>` and reads the string and
//! string-array values out of its GVariant text output. Lines look like:
//!
//! ```text
//! org.gnome.desktop.wm.keybindings close ['<Alt>F4']
//! org.gnome.desktop.wm.keybindings minimize @as []
//! org.gnome.settings-daemon.plugins.media-keys volume-step 6
//! ```

use futures::future::BoxFuture;
use keyhint_core::RawBinding;
use tokio::process::Command;

use super::{BindingSource, ImportError, ImportSource};

pub struct GsettingsSource {
    source: ImportSource,
    program: String,
}

impl GsettingsSource {
    pub fn new(source: ImportSource) -> Self {
        Self::with_program(source, "gsettings")
    }

    pub fn with_program(source: ImportSource, program: impl Into<String>) -> Self {
        Self {
            source,
            program: program.into(),
        }
    }

    async fn list(&self) -> Result<Vec<RawBinding>, ImportError> {
        let schema = self.source.schema();
        let output = Command::new(&self.program)
            .args(["list-recursively", schema])
            .output()
            .await
            .map_err(|source| ImportError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ImportError::Unavailable {
                schema: schema.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl BindingSource for GsettingsSource {
    fn source(&self) -> ImportSource {
        self.source
    }

    fn read_bindings(&self) -> BoxFuture<'_, Result<Vec<RawBinding>, ImportError>> {
        Box::pin(self.list())
    }
}

/// One record per binding string. Keys holding anything but strings are
/// dropped.
pub(crate) fn parse_listing(listing: &str) -> Vec<RawBinding> {
    let mut records = Vec::new();

    for line in listing.lines() {
        let mut parts = line.splitn(3, ' ');
        let (Some(_schema), Some(key), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };

        for binding in parse_string_values(value) {
            if !binding.is_empty() {
                records.push(RawBinding::new(key, binding));
            }
        }
    }

    records
}

/// Strings in a GVariant text value: a single string or an array of them.
pub(crate) fn parse_string_values(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value
        .strip_prefix("@as")
        .map(str::trim_start)
        .unwrap_or(value);

    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let mut strings = Vec::new();
        let mut rest = inner.trim_start();
        while !rest.is_empty() {
            let Some((s, after)) = parse_quoted(rest) else {
                break;
            };
            strings.push(s);
            rest = after.trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }
        return strings;
    }

    match parse_quoted(value) {
        Some((s, rest)) if rest.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

/// A single- or double-quoted string at the start of `input`, and what
/// follows it.
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let quote = input.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let mut out = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            c if c == quote => return Some((out, &input[i + c.len_utf8()..])),
            c => out.push(c),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_string() {
        assert_eq!(parse_string_values("'<Super>l'"), vec!["<Super>l"]);
        assert_eq!(parse_string_values("\"<Control>q\""), vec!["<Control>q"]);
    }

    #[test]
    fn test_parse_string_array() {
        assert_eq!(
            parse_string_values("['<Super>Up', '<Alt>F10']"),
            vec!["<Super>Up", "<Alt>F10"]
        );
        assert_eq!(parse_string_values("@as ['<Super>h']"), vec!["<Super>h"]);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_string_values("@as []").is_empty());
        assert!(parse_string_values("[]").is_empty());
    }

    #[test]
    fn test_parse_non_string_values() {
        assert!(parse_string_values("6").is_empty());
        assert!(parse_string_values("true").is_empty());
        assert!(parse_string_values("uint32 0").is_empty());
    }

    #[test]
    fn test_parse_escaped_quote() {
        assert_eq!(parse_string_values(r"'it\'s'"), vec!["it's"]);
    }

    #[test]
    fn test_parse_listing() {
        let listing = "\
org.gnome.desktop.wm.keybindings close ['<Alt>F4']
org.gnome.desktop.wm.keybindings minimize @as []
org.gnome.desktop.wm.keybindings switch-to-workspace-1 ['<Super>Home', '<Super>1']
org.gnome.settings-daemon.plugins.media-keys volume-step 6
org.gnome.settings-daemon.plugins.media-keys screensaver '<Super>l'
malformed
";
        let records = parse_listing(listing);
        assert_eq!(
            records,
            vec![
                RawBinding::new("close", "<Alt>F4"),
                RawBinding::new("switch-to-workspace-1", "<Super>Home"),
                RawBinding::new("switch-to-workspace-1", "<Super>1"),
                RawBinding::new("screensaver", "<Super>l"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let source = GsettingsSource::with_program(
            ImportSource::Shell,
            "/nonexistent/keyhint-test-gsettings",
        );
        let err = source.read_bindings().await.unwrap_err();
        match err {
            ImportError::Spawn { program, .. } => {
                assert_eq!(program, "/nonexistent/keyhint-test-gsettings")
            }
            _ => panic!("Expected Spawn error, got: {:?}", err),
        }
    }
}
