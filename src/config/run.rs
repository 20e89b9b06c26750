//! Parameters of one orchestrated run.

use std::time::Duration;

use super::{check_fraction, ConfigError};
use crate::inference::thresholds;
use crate::inference::InferenceConfig;

/// Upper bound on concurrent environments when none is configured.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Parameters of one orchestrated run.
///
/// `min_fk_match` and `similarity_threshold` override the matching fields of
/// `inference`; every other stage threshold comes from `inference` as is.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub min_fk_match: f64,
    pub similarity_threshold: f64,
    /// Cap on concurrently analysed environments.
    pub max_workers: usize,
    /// Global deadline in seconds. `None` waits for every environment.
    pub timeout_secs: Option<f64>,
    pub inference: InferenceConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_fk_match: thresholds::foreign_key::MIN_MATCH,
            similarity_threshold: thresholds::similarity::THRESHOLD,
            max_workers: DEFAULT_MAX_WORKERS,
            timeout_secs: None,
            inference: InferenceConfig::default(),
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn with_min_fk_match(mut self, value: f64) -> Self {
        self.min_fk_match = value;
        self
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, value: f64) -> Self {
        self.similarity_threshold = value;
        self
    }

    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Check every parameter. Called before any environment starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("min_fk_match", self.min_fk_match)?;
        check_fraction("similarity_threshold", self.similarity_threshold)?;
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if let Some(secs) = self.timeout_secs {
            if !(secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()) {
                return Err(ConfigError::InvalidTimeout(secs));
            }
        }
        self.resolved_inference().validate()
    }

    /// Stage configuration with the run-level overrides applied.
    pub fn resolved_inference(&self) -> InferenceConfig {
        self.inference
            .clone()
            .with_min_fk_match(self.min_fk_match)
            .with_similarity_threshold(self.similarity_threshold)
    }

    /// The deadline, or `None` when unset or not representable.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Workers actually used for `environments` environments.
    pub fn worker_count(&self, environments: usize) -> usize {
        self.max_workers.min(environments).max(1)
    }
}
