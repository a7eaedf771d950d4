// src/python.rs

use numpy::PyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::DetectorConfig;
use crate::detector::{AdaptiveAnomalyDetector as Inner, Detection};
use crate::error::DetectorError;

impl From<DetectorError> for PyErr {
    fn from(err: DetectorError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn to_py_pair(detection: Detection) -> (Vec<String>, Vec<f64>) {
    let labels = detection.labels.iter().map(|m| m.label().to_string()).collect();
    (labels, detection.scores)
}

#[pyclass(name = "AdaptiveAnomalyDetector")]
pub struct PyAdaptiveAnomalyDetector {
    inner: Inner,
}

#[pymethods]
impl PyAdaptiveAnomalyDetector {
    #[new]
    #[pyo3(signature = (
        window_size = 100,
        alpha = 0.3,
        contamination = 0.01,
        season_length = 50,
        drift_detection_interval = 100,
        n_estimators = 100,
        max_samples = 256,
        random_state = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        window_size: usize,
        alpha: f64,
        contamination: f64,
        season_length: usize,
        drift_detection_interval: usize,
        n_estimators: usize,
        max_samples: usize,
        random_state: Option<u64>,
    ) -> PyResult<Self> {
        let config = DetectorConfig {
            window_size,
            alpha,
            season_length,
            contamination,
            drift_detection_interval,
            n_estimators,
            max_samples,
            random_state,
        };
        Ok(PyAdaptiveAnomalyDetector {
            inner: Inner::new(config)?,
        })
    }

    /// Returns `(labels, scores)` for one sample.
    fn detect(&mut self, value: f64) -> PyResult<(Vec<String>, Vec<f64>)> {
        Ok(to_py_pair(self.inner.detect(value)?))
    }

    fn detect_batch(&mut self, xs: &PyArray1<f64>) -> PyResult<Vec<(Vec<String>, Vec<f64>)>> {
        let values = unsafe { xs.as_slice()? };
        let detections = self.inner.detect_batch(values)?;
        Ok(detections.into_iter().map(to_py_pair).collect())
    }

    #[getter]
    fn samples_seen(&self) -> u64 {
        self.inner.samples_seen()
    }

    #[getter]
    fn is_model_fitted(&self) -> bool {
        self.inner.is_model_fitted()
    }

    #[getter]
    fn fit_count(&self) -> usize {
        self.inner.fit_count()
    }

    fn raw_window(&self) -> Vec<f64> {
        self.inner.raw_window().to_vec()
    }

    fn ema_window(&self) -> Vec<f64> {
        self.inner
            .ema_window()
            .map(|w| w.to_vec())
            .unwrap_or_default()
    }
}

/// Python extension module.
#[pymodule]
fn adaptive_anomaly(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyAdaptiveAnomalyDetector>()?;
    Ok(())
}
