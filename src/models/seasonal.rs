use crate::config::SEASONAL_THRESHOLD_MULTIPLIER;
use crate::models::base_model::{BaseDetector, Method, Verdict};
use crate::utils::ss;
use crate::utils::window::BoundedWindow;

/// Compares a sample with the historical mean at its phase in the cycle.
///
/// Stateless apart from the season length; reads the shared raw window.
/// The threshold uses the volatility of the whole window, not the phase.
#[derive(Debug, Clone)]
pub struct SeasonalTracker {
    season_length: usize,
}

impl SeasonalTracker {
    pub fn new(season_length: usize) -> Self {
        SeasonalTracker { season_length }
    }

    /// Mean of the window entries at `phase`, `phase + L`, `phase + 2L`, ...
    pub fn phase_baseline(&self, window: &BoundedWindow, phase: usize) -> Option<f64> {
        if self.season_length == 0 {
            return None;
        }
        let phase_values = window.iter().skip(phase).step_by(self.season_length);
        ss::BatchStatistic::from_values(phase_values).map(|s| s.mean)
    }

    /// Judge `value` against `window`, which already holds it.
    pub fn is_anomalous(&self, value: f64, window: &BoundedWindow) -> Verdict {
        let n = window.len();
        if self.season_length == 0 || n < self.season_length {
            return Verdict::ABSTAIN;
        }

        let phase = n % self.season_length;
        let baseline = match self.phase_baseline(window, phase) {
            Some(b) => b,
            None => return Verdict::ABSTAIN,
        };
        let threshold = SEASONAL_THRESHOLD_MULTIPLIER * ss::std_dev(window.iter());
        let deviation = (value - baseline).abs();
        if threshold == 0.0 {
            return if deviation > 0.0 {
                Verdict::from_ratio(f64::INFINITY)
            } else {
                Verdict::ABSTAIN
            };
        }
        Verdict::from_ratio(deviation / threshold)
    }
}

impl BaseDetector for SeasonalTracker {
    fn method(&self) -> Method {
        Method::Seasonal
    }

    fn evaluate(&mut self, value: f64, history: &BoundedWindow) -> Verdict {
        self.is_anomalous(value, history)
    }
}
