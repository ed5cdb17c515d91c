//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::multimon::PersistenceMode;

/// Toggle behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Connector to toggle (e.g. "HDMI-1"); None = pick automatically
    #[serde(default)]
    pub monitor: Option<String>,

    /// Persistence mode for apply calls ("verify", "temporary", "persistent")
    #[serde(default)]
    pub persistence_mode: PersistenceMode,

    /// Delay before re-reading state after an apply, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    1200
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            monitor: None,
            persistence_mode: PersistenceMode::default(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Saved monitor layout document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLayoutConfig {
    /// Use saved geometry when turning a monitor on
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Document path (None = `$XDG_CONFIG_HOME/monitors.xml`)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for SavedLayoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
