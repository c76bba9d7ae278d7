//! Configuration management for the study timer

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration (~/.config/study-timer/config.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ring the terminal bell when a session completes
    #[serde(default = "default_alarm")]
    pub alarm: bool,

    /// Store sessions and settings here instead of the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_alarm() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alarm: default_alarm(),
            data_dir: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load config from file, defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }
}
