use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    #[diagnostic(
        code(keyhint::config::missing),
        help("run `keyhintd --import-only` to create one from the system shortcuts")
    )]
    Missing { path: PathBuf },

    #[error("Failed to parse KDL")]
    #[diagnostic(code(keyhint::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(keyhint::config::invalid))]
    Invalid { message: String },

    #[error("Failed to parse legacy JSON configuration: {0}")]
    #[diagnostic(code(keyhint::config::legacy_json))]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// True when the configuration file does not exist at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::Missing { .. })
    }
}
