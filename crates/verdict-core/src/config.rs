//! Run configuration
//!
//! Owned and validated by the caller; the engine and both models only read
//! it. Subjects copy the thresholds at creation, agents copy the smoothing
//! prior, so reconfiguring between runs never rewrites existing state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Subject posterior at or above this retires the subject as detected (default: 0.95)
    pub detection_threshold: f64,
    /// Subject posterior at or below this retires the subject as rejected (default: 0.05)
    pub rejection_threshold: f64,
    /// Whether agents update their confusion matrices on training events (default: true)
    pub agents_willing_to_learn: bool,
    /// Laplace smoothing prior on the confusion-matrix counts (default: 1.0)
    pub smoothing_alpha: f64,
    /// Population base rate: prior probability a fresh subject is positive (default: 0.5)
    pub prior_probability: f64,
    /// P(report positive | truth positive) for a fresh agent (default: 0.5)
    pub initial_pl: f64,
    /// P(report negative | truth negative) for a fresh agent (default: 0.5)
    pub initial_pd: f64,
    /// Processing cap: stop the batch after this many counted events (default: 10_000)
    pub max_events: u64,
    /// Record per-entity trajectories for reporting (default: false)
    pub track_history: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.95,
            rejection_threshold: 0.05,
            agents_willing_to_learn: true,
            smoothing_alpha: 1.0,
            prior_probability: 0.5,
            initial_pl: 0.5,
            initial_pd: 0.5,
            max_events: 10_000,
            track_history: false,
        }
    }
}

/// Configuration validation failure.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a probability in [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("rejection_threshold {rejection} must be below detection_threshold {detection}")]
    ThresholdOrder { rejection: f64, detection: f64 },

    #[error("smoothing_alpha must be positive, got {0}")]
    NonPositiveAlpha(f64),

    #[error("max_events must be positive")]
    ZeroCap,
}

impl RunConfig {
    /// Validate field ranges and cross-field preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("detection_threshold", self.detection_threshold),
            ("rejection_threshold", self.rejection_threshold),
            ("prior_probability", self.prior_probability),
            ("initial_pl", self.initial_pl),
            ("initial_pd", self.initial_pd),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        if self.rejection_threshold >= self.detection_threshold {
            return Err(ConfigError::ThresholdOrder {
                rejection: self.rejection_threshold,
                detection: self.detection_threshold,
            });
        }

        if !(self.smoothing_alpha > 0.0) || !self.smoothing_alpha.is_finite() {
            return Err(ConfigError::NonPositiveAlpha(self.smoothing_alpha));
        }

        if self.max_events == 0 {
            return Err(ConfigError::ZeroCap);
        }

        Ok(())
    }
}
