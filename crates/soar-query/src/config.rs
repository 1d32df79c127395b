//! Archive configuration.
//!
//! Loaded from TOML; every field has a default pointing at the public
//! Solar Orbiter Archive, so an empty file is a valid config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default synchronous TAP endpoint of the archive
pub const DEFAULT_TAP_URL: &str = "http://soar.esac.esa.int/soar-sl-tap/tap/sync";

/// Default table holding science data items
pub const DEFAULT_DATA_TABLE: &str = "v_sc_data_item";

/// Levels the archive knows about; anything else only triggers a warning
pub const DEFAULT_ALLOWED_LEVELS: [&str; 7] = ["L0", "L1", "L2", "L3", "LL01", "LL02", "LL03"];

/// Settings for walking attribute trees and rendering archive requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoarConfig {
    /// TAP endpoint that receives rendered queries
    pub tap_url: String,

    /// Table the ADQL query selects from
    pub data_table: String,

    /// Levels accepted without a warning (compared after upper-casing)
    pub allowed_levels: Vec<String>,
}

impl Default for SoarConfig {
    fn default() -> Self {
        Self {
            tap_url: DEFAULT_TAP_URL.to_string(),
            data_table: DEFAULT_DATA_TABLE.to_string(),
            allowed_levels: DEFAULT_ALLOWED_LEVELS
                .iter()
                .map(|level| level.to_string())
                .collect(),
        }
    }
}

impl SoarConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
