// src/models/ensemble_outlier.rs

use std::sync::Arc;

use ndarray::Array1;
use rand::prelude::*;
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::models::base_model::{BaseDetector, Method, Verdict};
use crate::models::iforest::IsolationForest;
use crate::utils::ss::StandardScaler;
use crate::utils::window::BoundedWindow;

/// Normalization and forest fitted together on one window.
///
/// Never mutated after construction; a refit builds a new snapshot and
/// replaces the `Arc` in one assignment.
#[derive(Debug)]
pub struct OutlierSnapshot {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl OutlierSnapshot {
    fn fit(
        window: &BoundedWindow,
        n_estimators: usize,
        max_samples: usize,
        contamination: f64,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let raw: Array1<f64> = window.iter().collect();
        let scaler = StandardScaler::fit(raw.view())?;
        let normalized = scaler.transform(raw.view()).to_vec();
        let forest = IsolationForest::fit(&normalized, n_estimators, max_samples, contamination, rng)?;
        Ok(OutlierSnapshot { scaler, forest })
    }

    pub fn verdict(&self, value: f64) -> Verdict {
        let (score, fired) = self.forest.classify(self.scaler.transform_one(value));
        Verdict { fired, score }
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitTrigger {
    Initial,
    Drift,
}

/// Isolation-forest outlier test over the rolling raw window.
///
/// The model is fitted the first time the window is full and refitted on
/// the current window every `drift_detection_interval` observations after
/// that. A sample that triggers a refit is scored by the new model. A failed
/// fit leaves the detector unfitted until the next scheduled refit.
#[derive(Debug, Clone)]
pub struct EnsembleOutlierDetector {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    drift_detection_interval: usize,
    rng: StdRng,
    model: Option<Arc<OutlierSnapshot>>,
    initial_fit_attempted: bool,
    samples_since_fit: usize,
    fit_count: usize,
}

impl EnsembleOutlierDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        let seed = config.random_state.unwrap_or_else(rand::random);
        EnsembleOutlierDetector {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            contamination: config.contamination,
            drift_detection_interval: config.drift_detection_interval,
            rng: StdRng::seed_from_u64(seed),
            model: None,
            initial_fit_attempted: false,
            samples_since_fit: 0,
            fit_count: 0,
        }
    }

    /// Count the new observation, refit if due, then score `value`.
    ///
    /// `window` must already contain `value`.
    pub fn observe(&mut self, value: f64, window: &BoundedWindow) -> Verdict {
        self.samples_since_fit += 1;

        let trigger = if !self.initial_fit_attempted {
            window.is_full().then_some(FitTrigger::Initial)
        } else if self.samples_since_fit >= self.drift_detection_interval {
            Some(FitTrigger::Drift)
        } else {
            None
        };
        if let Some(trigger) = trigger {
            self.initial_fit_attempted = true;
            self.refit(window, trigger);
        }

        match &self.model {
            Some(model) => model.verdict(value),
            None => Verdict::ABSTAIN,
        }
    }

    fn refit(&mut self, window: &BoundedWindow, trigger: FitTrigger) {
        self.samples_since_fit = 0;
        match OutlierSnapshot::fit(
            window,
            self.n_estimators,
            self.max_samples,
            self.contamination,
            &mut self.rng,
        ) {
            Ok(snapshot) => {
                self.fit_count += 1;
                debug!(
                    fit_count = self.fit_count,
                    ?trigger,
                    window_len = window.len(),
                    mean = snapshot.scaler.mean(),
                    scale = snapshot.scaler.scale(),
                    offset = snapshot.forest.offset(),
                    "ensemble outlier model fitted"
                );
                self.model = Some(Arc::new(snapshot));
            }
            Err(e) => {
                warn!(?trigger, error = %e, "ensemble outlier fit failed, model dropped");
                self.model = None;
            }
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Number of successful fits so far.
    pub fn fit_count(&self) -> usize {
        self.fit_count
    }

    pub fn samples_since_fit(&self) -> usize {
        self.samples_since_fit
    }

    /// The currently installed model, if any.
    pub fn snapshot(&self) -> Option<Arc<OutlierSnapshot>> {
        self.model.clone()
    }
}

impl BaseDetector for EnsembleOutlierDetector {
    fn method(&self) -> Method {
        Method::EnsembleOutlier
    }

    fn evaluate(&mut self, value: f64, history: &BoundedWindow) -> Verdict {
        self.observe(value, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window_size: usize, interval: usize) -> DetectorConfig {
        DetectorConfig::default()
            .with_window_size(window_size)
            .with_season_length(5)
            .with_drift_detection_interval(interval)
            .with_n_estimators(25)
            .with_random_state(7)
    }

    fn feed(detector: &mut EnsembleOutlierDetector, window: &mut BoundedWindow, value: f64) -> Verdict {
        window.push(value);
        detector.observe(value, window)
    }

    #[test]
    fn test_abstains_until_window_full() {
        let mut detector = EnsembleOutlierDetector::new(&config(20, 10));
        let mut window = BoundedWindow::new(20);
        for i in 0..19 {
            let verdict = feed(&mut detector, &mut window, (i % 3) as f64 * 1000.0);
            assert_eq!(verdict, Verdict::ABSTAIN);
            assert!(!detector.is_fitted());
        }
        feed(&mut detector, &mut window, 1.0);
        assert!(detector.is_fitted());
        assert_eq!(detector.fit_count(), 1);
        assert_eq!(detector.samples_since_fit(), 0);
    }

    #[test]
    fn test_refits_every_interval() {
        let mut detector = EnsembleOutlierDetector::new(&config(20, 7));
        let mut window = BoundedWindow::new(20);
        for i in 0..20 {
            feed(&mut detector, &mut window, (i % 5) as f64);
        }
        assert_eq!(detector.fit_count(), 1);
        for step in 1..=21 {
            feed(&mut detector, &mut window, (step % 5) as f64);
            assert_eq!(detector.fit_count(), 1 + step / 7, "after {} extra samples", step);
        }
    }

    #[test]
    fn test_refit_replaces_snapshot() {
        let mut detector = EnsembleOutlierDetector::new(&config(10, 3));
        let mut window = BoundedWindow::new(10);
        for i in 0..10 {
            feed(&mut detector, &mut window, i as f64);
        }
        let first = detector.snapshot().unwrap();
        for i in 0..3 {
            feed(&mut detector, &mut window, 100.0 + i as f64);
        }
        let second = detector.snapshot().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.scaler().mean() > first.scaler().mean());
    }

    #[test]
    fn test_constant_window_flags_nothing() {
        let mut detector = EnsembleOutlierDetector::new(&config(10, 4));
        let mut window = BoundedWindow::new(10);
        for _ in 0..30 {
            let verdict = feed(&mut detector, &mut window, 5.0);
            assert!(!verdict.fired);
        }
        assert!(detector.is_fitted());
    }

    fn overflowing(i: usize) -> f64 {
        if i % 2 == 0 {
            f64::MAX
        } else {
            -f64::MAX
        }
    }

    #[test]
    fn test_failed_initial_fit_waits_for_next_interval() {
        let mut detector = EnsembleOutlierDetector::new(&config(10, 4));
        let mut window = BoundedWindow::new(10);
        for i in 0..10 {
            let verdict = feed(&mut detector, &mut window, overflowing(i));
            assert_eq!(verdict, Verdict::ABSTAIN);
        }
        assert!(!detector.is_fitted());
        assert_eq!(detector.fit_count(), 0);
        assert_eq!(detector.samples_since_fit(), 0);

        // Attempts at 4 and 8 extra samples still see overflowing values;
        // the one at 12 sees a clean window.
        for step in 1..=12 {
            let verdict = feed(&mut detector, &mut window, step as f64);
            if step < 12 {
                assert_eq!(verdict, Verdict::ABSTAIN, "step {}", step);
                assert!(!detector.is_fitted());
            }
            assert_eq!(detector.samples_since_fit(), step % 4);
        }
        assert!(detector.is_fitted());
        assert_eq!(detector.fit_count(), 1);
    }

    #[test]
    fn test_failed_drift_refit_is_not_retried_every_sample() {
        let mut detector = EnsembleOutlierDetector::new(&config(10, 50));
        let mut window = BoundedWindow::new(10);
        for i in 0..50 {
            feed(&mut detector, &mut window, (i % 7) as f64);
        }
        assert_eq!(detector.fit_count(), 1);

        // The drift refit at 50 observations after the first fit fails.
        for i in 0..10 {
            feed(&mut detector, &mut window, overflowing(i));
        }
        assert!(!detector.is_fitted());
        assert_eq!(detector.fit_count(), 1);

        for step in 1..50 {
            let verdict = feed(&mut detector, &mut window, (step % 7) as f64);
            assert_eq!(verdict, Verdict::ABSTAIN, "step {}", step);
            assert_eq!(detector.fit_count(), 1, "refit attempted early at step {}", step);
        }
        feed(&mut detector, &mut window, 3.0);
        assert!(detector.is_fitted());
        assert_eq!(detector.fit_count(), 2);
    }
}
