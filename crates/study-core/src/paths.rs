//! Standard paths used by the study timer

use std::path::{Path, PathBuf};

const APP_DIR: &str = "study-timer";

/// Standard study timer paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/study-timer)
    pub data: PathBuf,
    /// Config directory (~/.config/study-timer)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join(APP_DIR);

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self { data, config }
    }

    /// Use `data` instead of the platform data directory
    pub fn with_data_dir(mut self, data: &Path) -> Self {
        self.data = data.to_path_buf();
        self
    }

    /// Path of the user configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }

    /// Path of the log file written while the terminal UI owns the screen
    pub fn log_file(&self) -> PathBuf {
        self.data.join("study-timer.log")
    }
}
