use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, StoreError};

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "circulation";
pub const DEFAULT_COLLECTION: &str = "newspaper";

/// Default maximum connections held by the driver's pool.
/// Kept low for single-caller tooling.
const DEFAULT_MAX_POOL_SIZE: u32 = 5;

const DEFAULT_SERVER_SELECTION_TIMEOUT_SECS: u64 = 10;

/// Environment variables consulted by [`StoreConfig::load`]
pub const ENV_URI: &str = "MONGODB_URI";
pub const ENV_DATABASE: &str = "CIRCULATION_DATABASE";
pub const ENV_COLLECTION: &str = "CIRCULATION_COLLECTION";

/// How the MongoDB store manages its client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionMode {
    /// One client opened at startup and shared until shutdown
    #[default]
    Pooled,
    /// A fresh client per operation, closed when the operation finishes
    PerOperation,
}

/// Connection target and collection for the circulation store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Reported to the server in the connection handshake
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub server_selection_timeout_secs: u64,
    pub connection_mode: ConnectionMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            app_name: Some("circulation".to_string()),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            server_selection_timeout_secs: DEFAULT_SERVER_SELECTION_TIMEOUT_SECS,
            connection_mode: ConnectionMode::default(),
        }
    }
}

impl StoreConfig {
    /// Load config: defaults, then the TOML file, then environment overrides.
    ///
    /// With `path = None` the file at [`StoreConfig::config_path`] is used
    /// when it exists; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Get config file path: ~/.circulation/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".circulation").join("config.toml"))
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        debug!("Loaded store config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| StoreError::config(format!("invalid TOML: {}", e)))
    }

    /// Apply overrides from a key lookup (the process environment in [`StoreConfig::load`]).
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(uri) = lookup(ENV_URI) {
            self.uri = uri;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = database;
        }
        if let Some(collection) = lookup(ENV_COLLECTION) {
            self.collection = collection;
        }
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }
}
