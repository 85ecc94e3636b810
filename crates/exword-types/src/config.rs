//! Shell configuration loaded from `exword.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExwordError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "EXWORD_CONFIG";

const CONFIG_FILE: &str = "exword.toml";
const APP_DIR: &str = "exword";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExwordConfig {
    /// Initial device debug level (0-5).
    #[serde(default)]
    pub debug: u8,
    /// Initial value of the `mkdir` option.
    #[serde(default)]
    pub mkdir: bool,
    /// History file name inside the data directory.
    #[serde(default = "default_history_file")]
    pub history_file: String,
    /// Maximum number of history entries kept on disk.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Settings for the built-in simulated dictionary.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Whether an SD card is inserted.
    #[serde(default = "yes")]
    pub sd_card: bool,
    /// Model name reported by `model`.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_history_file() -> String {
    ".exword_history".to_string()
}
fn default_history_size() -> usize {
    500
}
fn default_model() -> String {
    "XD-SP6600".to_string()
}
fn yes() -> bool {
    true
}

impl Default for ExwordConfig {
    fn default() -> Self {
        Self {
            debug: 0,
            mkdir: false,
            history_file: default_history_file(),
            history_size: default_history_size(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sd_card: true,
            model: default_model(),
        }
    }
}

impl ExwordConfig {
    /// Parse a config from TOML text and validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.debug > 5 {
            return Err(ExwordError::Config(format!(
                "debug must be between 0 and 5, got {}",
                config.debug
            )));
        }
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load the config from `$EXWORD_CONFIG`, else from the per-user data
    /// directory, else fall back to defaults.
    ///
    /// An explicitly named file must exist; the data-directory file is
    /// optional.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(path);
            log::info!("Loading config from {}", path.display());
            return Self::from_file(&path);
        }
        match data_dir() {
            Some(dir) => {
                let path = dir.join(CONFIG_FILE);
                if path.is_file() {
                    log::info!("Loading config from {}", path.display());
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            },
            None => Ok(Self::default()),
        }
    }

    /// Full path of the persisted history file, if a data directory exists.
    pub fn history_path(&self) -> Option<PathBuf> {
        data_dir().map(|dir| dir.join(&self.history_file))
    }
}

/// Per-user data directory for exword (`<data_dir>/exword`).
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}
