//! # Configuration Loader
//!
//! Reads a TOML file and maps it onto [`KeychainConfig`]. Pure data loading:
//! no validation, no defaults beyond what the DTO itself applies.

use anyhow::Context;
use std::path::PathBuf;

use kw_core::KeychainConfig;

/// Load configuration from a TOML file.
///
/// Empty strings and missing sections are accepted as they are.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<KeychainConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    KeychainConfig::from_toml(&toml_value)
}
