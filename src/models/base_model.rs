use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ema::EmaTracker;
use crate::models::ensemble_outlier::EnsembleOutlierDetector;
use crate::models::seasonal::SeasonalTracker;
use crate::utils::window::BoundedWindow;

/// The detection methods, in the order the fusion step evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "EMA")]
    Ema,
    EnsembleOutlier,
    Seasonal,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Ema, Method::EnsembleOutlier, Method::Seasonal];

    pub fn label(&self) -> &'static str {
        match self {
            Method::Ema => "EMA",
            Method::EnsembleOutlier => "EnsembleOutlier",
            Method::Seasonal => "Seasonal",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One detector's answer for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub fired: bool,
    pub score: f64,
}

impl Verdict {
    /// Returned while a detector is cold or has no model.
    pub const ABSTAIN: Verdict = Verdict {
        fired: false,
        score: 0.0,
    };

    /// Ratio test shared by the threshold detectors: fires when `score > 1`.
    pub fn from_ratio(score: f64) -> Self {
        Verdict {
            fired: score > 1.0,
            score,
        }
    }
}

/// A common trait for the per-sample detectors.
///
/// `history` is the shared raw-value window. The caller has already appended
/// `value` to it; detectors only read it.
pub trait BaseDetector {
    fn method(&self) -> Method;

    /// Update internal state with `value` and judge it.
    fn evaluate(&mut self, value: f64, history: &BoundedWindow) -> Verdict;
}

/// One of the three detectors, as owned by the fusion step.
#[derive(Debug, Clone)]
pub enum MethodDetector {
    Ema(EmaTracker),
    EnsembleOutlier(EnsembleOutlierDetector),
    Seasonal(SeasonalTracker),
}

impl MethodDetector {
    pub fn as_ema(&self) -> Option<&EmaTracker> {
        match self {
            MethodDetector::Ema(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_ensemble(&self) -> Option<&EnsembleOutlierDetector> {
        match self {
            MethodDetector::EnsembleOutlier(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_seasonal(&self) -> Option<&SeasonalTracker> {
        match self {
            MethodDetector::Seasonal(d) => Some(d),
            _ => None,
        }
    }
}

impl BaseDetector for MethodDetector {
    fn method(&self) -> Method {
        match self {
            MethodDetector::Ema(d) => d.method(),
            MethodDetector::EnsembleOutlier(d) => d.method(),
            MethodDetector::Seasonal(d) => d.method(),
        }
    }

    fn evaluate(&mut self, value: f64, history: &BoundedWindow) -> Verdict {
        match self {
            MethodDetector::Ema(d) => d.evaluate(value, history),
            MethodDetector::EnsembleOutlier(d) => d.evaluate(value, history),
            MethodDetector::Seasonal(d) => d.evaluate(value, history),
        }
    }
}
