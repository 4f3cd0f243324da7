//! Server configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relay_core::RelayConfig;
use serde::{Deserialize, Serialize};

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// HTTP listen address (e.g. "127.0.0.1:8000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub relay: RelayConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            relay: RelayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from an optional file, falling back to defaults.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from file: {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                tracing::warn!("Config file not found: {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}
