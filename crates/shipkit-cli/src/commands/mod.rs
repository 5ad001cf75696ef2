//! CLI commands

pub mod can_pull;
pub mod images;
pub mod metadata;
pub mod pull;

use std::path::Path;

use shipkit_core::License;
use shipkit_repo::ShipkitConfig;

use crate::error::{CliError, Result};

/// Configuration from `path`, or from the default location
pub fn load_config(path: Option<&Path>) -> Result<ShipkitConfig> {
    let config = match path {
        Some(path) => ShipkitConfig::load_from(path)?,
        None => ShipkitConfig::load()?,
    };
    Ok(config)
}

pub fn load_license(path: &Path) -> Result<License> {
    License::load(path).map_err(|e| {
        CliError::input_with_help(
            format!("cannot load license {}: {}", path.display(), e),
            "the license file is the YAML document downloaded from the vendor portal",
        )
    })
}
