//! Configuration parsing for keyhint
//!
//! This crate handles loading the KDL configuration file (including the
//! one-time migration of older layouts and the legacy JSON format) and
//! writing it back after a system import.

mod error;
mod legacy;
mod migrate;
mod model;
mod parser;
mod writer;

pub use error::ConfigError;
pub use legacy::load_legacy_json;
pub use migrate::{migrate, VersionedConfig};
pub use model::*;
pub use parser::{load_configuration, parse_config_str, parse_document};
pub use writer::{render_config, save_configuration, save_imported_shortcuts};
