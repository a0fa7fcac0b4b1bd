use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SubwatchError};

/// Global subwatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote delegate settings
    #[serde(default)]
    pub delegate: DelegateConfig,

    /// Characters of page text handed to the scanner by the CLI
    #[serde(default = "default_scan_limit")]
    pub scan_text_limit: usize,
}

/// Settings for the external text-completion delegate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateConfig {
    /// Endpoint receiving the instruction-plus-text payload
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name forwarded in the request
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delegate: DelegateConfig::default(),
            scan_text_limit: default_scan_limit(),
        }
    }
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080/v1/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_scan_limit() -> usize {
    5_000
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubwatchError::ConfigError(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "subwatch")
            .ok_or_else(|| SubwatchError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    ///
    /// Supports SUBWATCH_DATA environment variable for test isolation
    pub fn data_dir() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("SUBWATCH_DATA") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "subwatch")
            .ok_or_else(|| SubwatchError::ConfigError("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan_text_limit, 5_000);
        assert_eq!(config.delegate.timeout_secs, 30);
        assert!(config.delegate.api_key_env.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[delegate]\nmodel = \"local-extractor\"\n").unwrap();
        assert_eq!(config.delegate.model, "local-extractor");
        assert_eq!(config.delegate.timeout_secs, 30);
        assert_eq!(config.scan_text_limit, 5_000);
    }
}
