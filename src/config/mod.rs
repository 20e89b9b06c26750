//! Configuration for relic.
//!
//! Run parameters ([`RunConfig`]) are validated before any environment is
//! touched; an invalid value fails the whole run with a [`ConfigError`].
//! Settings files ([`Settings`]) are a TOML front end that produce a
//! `RunConfig`.

mod run;
mod settings;

pub use run::{RunConfig, DEFAULT_MAX_WORKERS};
pub use settings::{OrchestratorSettings, Settings, SettingsError};

use thiserror::Error;

/// Invalid run parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be within [0, 100], got {value}")]
    ScoreOutOfRange { name: &'static str, value: f64 },

    #[error("inconsistent thresholds: {0}")]
    ThresholdOrder(String),

    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),

    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("max_workers must be at least 1")]
    ZeroWorkers,

    #[error("timeout must be a positive, representable number of seconds, got {0}")]
    InvalidTimeout(f64),
}

pub(crate) fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::FractionOutOfRange { name, value })
    }
}

pub(crate) fn check_score(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ScoreOutOfRange { name, value })
    }
}
