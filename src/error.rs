//! Error types for the adaptive detector.

use thiserror::Error;

/// Errors surfaced by the detector and its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// A sample that would poison the windows (NaN or infinite).
    #[error("Invalid sample at index {index}: {value} is not a finite number")]
    InvalidSample { index: u64, value: f64 },

    #[error("Invalid configuration: {name} - {reason}")]
    InvalidConfiguration { name: String, reason: String },

    /// The ensemble model could not be fitted on the current window.
    #[error("Model fit error: {0}")]
    ModelFit(String),
}

impl DetectorError {
    pub(crate) fn config(name: &str, reason: impl Into<String>) -> Self {
        DetectorError::InvalidConfiguration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for detector operations.
pub type Result<T> = std::result::Result<T, DetectorError>;
