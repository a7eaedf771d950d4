//! Construction-time options for [`AdaptiveAnomalyDetector`](crate::AdaptiveAnomalyDetector).

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Multiplier `k` applied to the recent EMA volatility.
pub const EMA_THRESHOLD_MULTIPLIER: f64 = 3.0;

/// Multiplier applied to the raw window's standard deviation by the seasonal test.
pub const SEASONAL_THRESHOLD_MULTIPLIER: f64 = 3.0;

/// Detector configuration. Immutable once a detector has been built from it.
///
/// Missing fields fall back to [`Default`] when deserialized, so a partial
/// document such as `{"window_size": 200}` is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Capacity of the raw and EMA windows.
    pub window_size: usize,
    /// EMA smoothing factor in `(0, 1]`.
    pub alpha: f64,
    /// Cycle length for the seasonal phase, and size of the recent EMA subwindow.
    pub season_length: usize,
    /// Expected fraction of outliers, in `(0, 0.5)`.
    pub contamination: f64,
    /// Observations between forced refits of the ensemble model.
    pub drift_detection_interval: usize,
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Upper bound on the per-tree subsample.
    pub max_samples: usize,
    /// Seed for tree construction. `None` draws a fresh one.
    pub random_state: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            window_size: 100,
            alpha: 0.3,
            season_length: 50,
            contamination: 0.01,
            drift_detection_interval: 100,
            n_estimators: 100,
            max_samples: 256,
            random_state: None,
        }
    }
}

impl DetectorConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_season_length(mut self, season_length: usize) -> Self {
        self.season_length = season_length;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_drift_detection_interval(mut self, interval: usize) -> Self {
        self.drift_detection_interval = interval;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Parse a JSON document and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(json)
            .map_err(|e| DetectorError::config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.season_length < 2 {
            return Err(DetectorError::config(
                "season_length",
                format!("must be at least 2, got {}", self.season_length),
            ));
        }
        if self.window_size <= self.season_length {
            return Err(DetectorError::config(
                "window_size",
                format!(
                    "must be greater than season_length ({}), got {}",
                    self.season_length, self.window_size
                ),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(DetectorError::config(
                "alpha",
                format!("must be in (0, 1], got {}", self.alpha),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination < 0.5) {
            return Err(DetectorError::config(
                "contamination",
                format!("must be in (0, 0.5), got {}", self.contamination),
            ));
        }
        if self.drift_detection_interval == 0 {
            return Err(DetectorError::config(
                "drift_detection_interval",
                "must be positive",
            ));
        }
        if self.n_estimators == 0 {
            return Err(DetectorError::config("n_estimators", "must be positive"));
        }
        if self.max_samples == 0 {
            return Err(DetectorError::config("max_samples", "must be positive"));
        }
        Ok(())
    }
}
