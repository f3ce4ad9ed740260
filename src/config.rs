//! `netweave.yaml` configuration
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields the stock animation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::ClusterConfig;
use crate::driver::DriverConfig;
use crate::mock::MockGraphConfig;
use crate::simulation::PhysicsConfig;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "netweave.yaml";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Canvas size used when the caller does not supply one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// All tunables, grouped by the component that consumes them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetweaveConfig {
    pub mock: MockGraphConfig,
    pub cluster: ClusterConfig,
    pub physics: PhysicsConfig,
    pub driver: DriverConfig,
    pub canvas: CanvasConfig,
}

impl NetweaveConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })
    }

    /// Load a config file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_yaml(&text, &shown)?;
                tracing::debug!(path = %shown, "loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %shown, "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: shown,
                source,
            }),
        }
    }
}
