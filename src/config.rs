//! User configuration and preferences

use crate::domain::DEFAULT_FILTER;
use crate::error::{DocMergerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Whether the welcome dialog has been shown
    pub welcome_shown: bool,
    /// Extension filters active when the app starts
    pub default_filters: Vec<String>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            welcome_shown: false,
            default_filters: DEFAULT_FILTER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/docmerger/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docmerger").join("config.json"))
    }

    fn require_path() -> Result<PathBuf> {
        Self::config_path().ok_or_else(|| {
            DocMergerError::ConfigError("Could not determine config directory".to_string())
        })
    }

    /// Load config from file, or create default if doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::require_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            DocMergerError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            DocMergerError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::require_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DocMergerError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            DocMergerError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            DocMergerError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }
}
