//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::multimon::{PersistenceMode, SavedLayoutStore};

pub mod types;

pub use types::{LoggingConfig, SavedLayoutConfig, ToggleConfig};

/// Longest accepted settle delay
pub const MAX_SETTLE_DELAY_MS: u64 = 60_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Toggle configuration
    #[serde(default)]
    pub toggle: ToggleConfig,
    /// Saved layout configuration
    #[serde(default)]
    pub saved_layout: SavedLayoutConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/monitor-toggle/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("monitor-toggle").join("config.toml"))
    }

    /// Resolve the config file to load
    ///
    /// A path given explicitly must exist. The default path is optional.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        match explicit {
            Some(path) if !path.exists() => {
                anyhow::bail!("Config file not found: {}", path.display())
            }
            Some(path) => Ok(Some(path.to_path_buf())),
            None => Ok(Self::default_path().filter(|path| path.exists())),
        }
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            toggle: ToggleConfig::default(),
            saved_layout: SavedLayoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.toggle.settle_delay_ms == 0 {
            anyhow::bail!("settle_delay_ms must be greater than 0");
        }
        if self.toggle.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            anyhow::bail!(
                "settle_delay_ms ({}) exceeds maximum of {}",
                self.toggle.settle_delay_ms,
                MAX_SETTLE_DELAY_MS
            );
        }

        if let Some(monitor) = &self.toggle.monitor {
            if monitor.trim().is_empty() {
                anyhow::bail!("Monitor connector name cannot be empty");
            }
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, monitor: Option<String>, mode: Option<PersistenceMode>) -> Self {
        if let Some(monitor) = monitor {
            self.toggle.monitor = Some(monitor);
        }
        if let Some(mode) = mode {
            self.toggle.persistence_mode = mode;
        }

        self
    }

    /// Settle delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.toggle.settle_delay_ms)
    }

    /// Saved layout store for this configuration
    pub fn saved_layout_store(&self) -> SavedLayoutStore {
        if !self.saved_layout.enabled {
            return SavedLayoutStore::disabled();
        }

        match self
            .saved_layout
            .path
            .clone()
            .or_else(SavedLayoutStore::default_path)
        {
            Some(path) => SavedLayoutStore::new(path),
            None => SavedLayoutStore::disabled(),
        }
    }
}
