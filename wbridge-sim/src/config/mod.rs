//! Configuration module for wbridge-sim.
//!
//! Handles loading configuration from the TOML file and CLI overrides.

pub mod file;

use crate::config::file::{FileConfig, SimulationConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wbridge_core::config::{ChannelCapacities, InvalidCapacity, NotificationPrefs};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

impl From<InvalidCapacity> for ConfigError {
    fn from(e: InvalidCapacity) -> Self {
        ConfigError::ValidationError(e.to_string())
    }
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub channels: ChannelCapacities,
    pub notifications: NotificationPrefs,
    pub simulation: SimulationConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    wallets_override: Option<usize>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, wallets_override: Option<usize>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            wallets_override,
        }
    }

    /// Load and validate the configuration.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str::<FileConfig>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Config file {:?} not found, using defaults",
                    self.config_path
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(wallets) = self.wallets_override {
            file_config.simulation.wallets = wallets;
        }

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            channels: file_config.channels,
            notifications: file_config.notifications,
            simulation: file_config.simulation,
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        config.channels.validate()?;
        if config.simulation.wallets == 0 {
            return Err(ConfigError::ValidationError(
                "at least one wallet must be simulated".to_string(),
            ));
        }
        if config.simulation.event_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "event_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "wbridge-sim-{}-{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loader = ConfigLoader::new("/nonexistent/wbridge.toml", Some(5));
        let config = loader.load().unwrap();
        assert_eq!(config.channels, ChannelCapacities::default());
        assert_eq!(config.simulation.wallets, 5);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let path = write_config("zero", "[channels]\nsync_progress = 0\n");
        let result = ConfigLoader::new(&path, None).load();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let path = write_config("malformed", "[channels\n");
        let result = ConfigLoader::new(&path, None).load();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
