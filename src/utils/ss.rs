use ndarray::{Array1, ArrayView1};

use crate::error::{DetectorError, Result};

/// Population statistics (max, min, mean, var, std) over a batch of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStatistic {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub var: f64,
    pub std: f64,
}

impl BatchStatistic {
    /// Two-pass statistics. Returns `None` on an empty input.
    ///
    /// Sums that overflow are redone on values divided by the largest
    /// magnitude, so finite inputs always give finite `mean` and `std`.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter();
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for v in iter.clone() {
            count += 1;
            sum += v;
            max = max.max(v);
            min = min.min(v);
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        let magnitude = max.abs().max(min.abs());

        let mut mean = sum / n;
        if !mean.is_finite() && magnitude.is_finite() {
            mean = iter.clone().map(|v| v / magnitude).sum::<f64>() / n * magnitude;
        }
        let sum_squares: f64 = iter.clone().map(|v| (v - mean) * (v - mean)).sum();
        let (var, std) = if sum_squares.is_finite() || !magnitude.is_finite() || magnitude == 0.0 {
            let var = sum_squares / n;
            (var, var.sqrt())
        } else {
            let scaled_mean = mean / magnitude;
            let scaled_var = iter
                .map(|v| v / magnitude - scaled_mean)
                .map(|d| d * d)
                .sum::<f64>()
                / n;
            (scaled_var * magnitude * magnitude, scaled_var.sqrt() * magnitude)
        };
        Some(BatchStatistic {
            count,
            max,
            min,
            mean,
            var,
            std,
        })
    }
}

/// Population standard deviation, `0.0` when empty.
pub fn std_dev<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    BatchStatistic::from_values(values).map_or(0.0, |s| s.std)
}

/// Standard scaler for a single feature: `(x - mean) / scale`.
///
/// A zero scale is replaced by 1 so constant data maps to zeros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    pub fn fit(data: ArrayView1<'_, f64>) -> Result<Self> {
        let mean = data
            .mean()
            .ok_or_else(|| DetectorError::ModelFit("cannot normalize an empty window".into()))?;
        let std = data.std(0.0);
        if !mean.is_finite() || !std.is_finite() {
            return Err(DetectorError::ModelFit(format!(
                "normalization overflow (mean {}, scale {})",
                mean, std
            )));
        }
        let scale = if std == 0.0 { 1.0 } else { std };
        Ok(StandardScaler { mean, scale })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform_one(&self, x: f64) -> f64 {
        (x - self.mean) / self.scale
    }

    pub fn transform(&self, data: ArrayView1<'_, f64>) -> Array1<f64> {
        data.mapv(|x| self.transform_one(x))
    }
}
