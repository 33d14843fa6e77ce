//! TOML manifests holding the desired state of one subscription.

use std::path::Path;

use tracing::debug;

use crate::flat::FlatConfig;
use crate::{ConfigError, Result};

/// Parses a manifest from TOML text.
pub fn parse_manifest(text: &str) -> Result<FlatConfig> {
    toml::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))
}

/// Reads and parses a manifest file.
pub fn load_manifest(path: &Path) -> Result<FlatConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = parse_manifest(&text)?;
    debug!(path = %path.display(), name = %config.name, "Loaded manifest");
    Ok(config)
}

/// Renders a configuration back to TOML, the inverse of [`parse_manifest`].
pub fn to_toml(config: &FlatConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::parse(e.to_string()))
}
