//! Fusion of the three detectors into one per-sample verdict.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::models::base_model::{BaseDetector, Method, MethodDetector};
use crate::models::ema::EmaTracker;
use crate::models::ensemble_outlier::{EnsembleOutlierDetector, OutlierSnapshot};
use crate::models::seasonal::SeasonalTracker;
use crate::utils::window::BoundedWindow;

/// Methods that fired for one sample and their scores, in evaluation order.
///
/// An empty detection means "no anomaly".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub labels: Vec<Method>,
    pub scores: Vec<f64>,
}

impl Detection {
    fn push(&mut self, method: Method, score: f64) {
        self.labels.push(method);
        self.scores.push(score);
    }

    pub fn is_anomaly(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn fired(&self, method: Method) -> bool {
        self.labels.contains(&method)
    }

    pub fn score_of(&self, method: Method) -> Option<f64> {
        self.iter().find(|(m, _)| *m == method).map(|(_, s)| s)
    }

    pub fn label_strings(&self) -> Vec<&'static str> {
        self.labels.iter().map(Method::label).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Method, f64)> + '_ {
        self.labels.iter().copied().zip(self.scores.iter().copied())
    }
}

/// Adaptive multi-method anomaly detector for one scalar stream.
///
/// Owns the raw-value window and every detector. Samples must be submitted
/// in arrival order, one call at a time; wrap the detector in a mutex if
/// several producers share it.
#[derive(Debug, Clone)]
pub struct AdaptiveAnomalyDetector {
    config: DetectorConfig,
    raw_window: BoundedWindow,
    detectors: [MethodDetector; 3],
    samples_seen: u64,
}

impl AdaptiveAnomalyDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        info!(
            window_size = config.window_size,
            alpha = config.alpha,
            season_length = config.season_length,
            contamination = config.contamination,
            drift_detection_interval = config.drift_detection_interval,
            n_estimators = config.n_estimators,
            "adaptive anomaly detector created"
        );
        Ok(AdaptiveAnomalyDetector {
            raw_window: BoundedWindow::new(config.window_size),
            detectors: [
                MethodDetector::Ema(EmaTracker::new(
                    config.alpha,
                    config.window_size,
                    config.season_length,
                )),
                MethodDetector::EnsembleOutlier(EnsembleOutlierDetector::new(&config)),
                MethodDetector::Seasonal(SeasonalTracker::new(config.season_length)),
            ],
            samples_seen: 0,
            config,
        })
    }

    /// Run every detector on `value` and collect the ones that fired.
    ///
    /// Non-finite samples are rejected before any state is touched.
    pub fn detect(&mut self, value: f64) -> Result<Detection> {
        if !value.is_finite() {
            warn!(index = self.samples_seen, value, "rejected non-finite sample");
            return Err(DetectorError::InvalidSample {
                index: self.samples_seen,
                value,
            });
        }

        self.raw_window.push(value);
        self.samples_seen += 1;

        let mut detection = Detection::default();
        for detector in self.detectors.iter_mut() {
            let verdict = detector.evaluate(value, &self.raw_window);
            if verdict.fired {
                detection.push(detector.method(), verdict.score);
            }
        }

        trace!(
            index = self.samples_seen - 1,
            value,
            labels = ?detection.label_strings(),
            "sample evaluated"
        );
        Ok(detection)
    }

    /// Detect over a slice in order. Stops at the first invalid sample;
    /// samples before it stay applied.
    pub fn detect_batch(&mut self, values: &[f64]) -> Result<Vec<Detection>> {
        values.iter().map(|&v| self.detect(v)).collect()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn raw_window(&self) -> &BoundedWindow {
        &self.raw_window
    }

    /// Evaluation order: EMA, ensemble outlier, seasonal.
    pub fn detectors(&self) -> &[MethodDetector] {
        &self.detectors
    }

    fn ema(&self) -> Option<&EmaTracker> {
        self.detectors.iter().find_map(MethodDetector::as_ema)
    }

    fn ensemble(&self) -> Option<&EnsembleOutlierDetector> {
        self.detectors.iter().find_map(MethodDetector::as_ensemble)
    }

    pub fn ema_window(&self) -> Option<&BoundedWindow> {
        self.ema().map(EmaTracker::window)
    }

    pub fn current_ema(&self) -> Option<f64> {
        self.ema().and_then(EmaTracker::current)
    }

    /// Accepted samples so far.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn is_model_fitted(&self) -> bool {
        self.ensemble().map_or(false, EnsembleOutlierDetector::is_fitted)
    }

    pub fn fit_count(&self) -> usize {
        self.ensemble().map_or(0, EnsembleOutlierDetector::fit_count)
    }

    pub fn model_snapshot(&self) -> Option<Arc<OutlierSnapshot>> {
        self.ensemble().and_then(EnsembleOutlierDetector::snapshot)
    }
}
