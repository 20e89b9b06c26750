//! TOML-based configuration for relic.
//!
//! Example configuration:
//! ```toml
//! [orchestrator]
//! max_workers = 4
//! timeout_seconds = 300
//!
//! [inference.foreign_key]
//! min_match = 0.75
//! min_sample_overlap = 5
//!
//! [inference.similarity]
//! threshold = 0.8
//! max_tables = 1000
//! scale_strategy = "decline"
//!
//! [inference.duplicates]
//! sample_limit = 5000
//! ```
//!
//! Every section is optional; missing values fall back to the defaults in
//! [`crate::inference::thresholds`].

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConfigError, RunConfig, DEFAULT_MAX_WORKERS};
use crate::inference::InferenceConfig;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub orchestrator: OrchestratorSettings,
    pub inference: InferenceConfig,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Maximum environments analysed at once.
    pub max_workers: usize,

    /// Global deadline for the whole run, in seconds.
    pub timeout_seconds: Option<f64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            timeout_seconds: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RELIC_CONFIG`
    /// 2. `./relic.toml`
    /// 3. `~/.config/relic/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RELIC_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("relic.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relic").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Validated run parameters.
    pub fn run_config(&self) -> Result<RunConfig, SettingsError> {
        let config = RunConfig {
            min_fk_match: self.inference.foreign_key.min_match,
            similarity_threshold: self.inference.similarity.threshold,
            max_workers: self.orchestrator.max_workers,
            timeout_secs: self.orchestrator.timeout_seconds,
            inference: self.inference.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
