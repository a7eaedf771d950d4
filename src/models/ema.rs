// src/models/ema.rs

use crate::config::EMA_THRESHOLD_MULTIPLIER;
use crate::models::base_model::{BaseDetector, Method, Verdict};
use crate::utils::ss;
use crate::utils::window::BoundedWindow;

/// Online exponential moving average with a bounded history of smoothed values.
///
/// A sample is anomalous when its distance from the current EMA exceeds
/// `k` times the volatility of the last `recent_len` smoothed values.
#[derive(Debug, Clone)]
pub struct EmaTracker {
    alpha: f64,
    recent_len: usize,
    ema_window: BoundedWindow,
}

impl EmaTracker {
    pub fn new(alpha: f64, window_size: usize, recent_len: usize) -> Self {
        EmaTracker {
            alpha,
            recent_len,
            ema_window: BoundedWindow::new(window_size),
        }
    }

    /// Fold `value` into the average and record the result.
    pub fn update(&mut self, value: f64) -> f64 {
        let ema = match self.ema_window.last() {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.ema_window.push(ema);
        ema
    }

    pub fn is_anomalous(&mut self, value: f64) -> Verdict {
        let ema = self.update(value);
        if !self.ema_window.is_full() {
            return Verdict::ABSTAIN;
        }

        let threshold = EMA_THRESHOLD_MULTIPLIER * ss::std_dev(self.ema_window.tail(self.recent_len));
        let deviation = (value - ema).abs();
        if threshold == 0.0 {
            // Flat recent history: any deviation is infinitely far out.
            return if deviation > 0.0 {
                Verdict::from_ratio(f64::INFINITY)
            } else {
                Verdict::ABSTAIN
            };
        }
        Verdict::from_ratio(deviation / threshold)
    }

    pub fn current(&self) -> Option<f64> {
        self.ema_window.last()
    }

    pub fn window(&self) -> &BoundedWindow {
        &self.ema_window
    }
}

impl BaseDetector for EmaTracker {
    fn method(&self) -> Method {
        Method::Ema
    }

    fn evaluate(&mut self, value: f64, _history: &BoundedWindow) -> Verdict {
        self.is_anomalous(value)
    }
}
