//! Adaptive multi-method anomaly detection for a single scalar stream.
//!
//! Each sample is judged by three detectors: an EMA deviation test, an
//! isolation-forest outlier test over a rolling window that is refitted
//! periodically, and a seasonal test against the mean at the sample's phase.
//! [`AdaptiveAnomalyDetector::detect`] returns the methods that fired.

pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use config::{DetectorConfig, EMA_THRESHOLD_MULTIPLIER, SEASONAL_THRESHOLD_MULTIPLIER};
pub use detector::{AdaptiveAnomalyDetector, Detection};
pub use error::{DetectorError, Result};
pub use models::base_model::{BaseDetector, Method, MethodDetector, Verdict};
pub use models::ema::EmaTracker;
pub use models::ensemble_outlier::{EnsembleOutlierDetector, OutlierSnapshot};
pub use models::iforest::IsolationForest;
pub use models::seasonal::SeasonalTracker;
pub use utils::ss::{StandardScaler, BatchStatistic};
pub use utils::window::BoundedWindow;
