//! Configuration loading and management
//!
//! Handles parsing of the optional `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Storage;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sharing-link configuration
    #[serde(default)]
    pub links: LinksConfig,

    /// Identity configuration
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Config {
    /// Load configuration from the data directory, falling back to defaults
    /// when the file is absent.
    pub fn load(storage: &Storage) -> Result<Self> {
        let path = storage.config_file();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Configuration for generated group invite links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Origin prepended to `/join/<task-id>` when a group task is created
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://deadline.local".to_string()
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Identity-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Display name used when the local identity is first created.
    /// When unset, a name is derived from the generated id.
    #[serde(default)]
    pub default_name: Option<String>,
}
