// src/models/iforest.rs

use rand::prelude::*;
use rayon::prelude::*;
use std::cmp;

use crate::error::{DetectorError, Result};

const EULER_GAMMA: f64 = 0.5772156649;

// Isolation tree node over a single feature.
#[derive(Debug)]
struct Node {
    split_value: f64,
    size: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn leaf(size: usize) -> Self {
        Node {
            split_value: 0.0,
            size,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Expected path length of an unsuccessful BST search among `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// An immutable isolation forest fitted on one batch of (already normalized) values.
///
/// Scores follow the "larger is more anomalous" convention: the raw
/// isolation score minus the offset learned from the contamination rate,
/// so a point is an outlier exactly when its score is positive.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
    offset: f64,
}

impl IsolationForest {
    fn build_tree(data: &[f64], height: usize, height_limit: usize, rng: &mut StdRng) -> Node {
        let size = data.len();
        let mut node = Node::leaf(size);

        if size <= 1 || height >= height_limit {
            return node;
        }

        let mut min_val = data[0];
        let mut max_val = min_val;
        for &val in data {
            min_val = min_val.min(val);
            max_val = max_val.max(val);
        }
        if (max_val - min_val).abs() < 1e-10 {
            return node;
        }

        let split_value = rng.gen::<f64>() * (max_val - min_val) + min_val;
        let (left_data, right_data): (Vec<f64>, Vec<f64>) =
            data.iter().partition(|&&v| v < split_value);

        if !left_data.is_empty() && !right_data.is_empty() {
            node.split_value = split_value;
            node.left = Some(Box::new(Self::build_tree(&left_data, height + 1, height_limit, rng)));
            node.right = Some(Box::new(Self::build_tree(&right_data, height + 1, height_limit, rng)));
        }

        node
    }

    fn path_length(node: &Node, x: f64, current_height: usize) -> f64 {
        if node.is_leaf() {
            return current_height as f64 + average_path_length(node.size);
        }
        let next = if x < node.split_value { &node.left } else { &node.right };
        match next {
            Some(child) => Self::path_length(child, x, current_height + 1),
            None => current_height as f64,
        }
    }

    /// Grow `n_estimators` trees on bootstrap subsamples of `data`.
    ///
    /// Each tree is seeded from `rng`, so the result depends only on the
    /// data and the RNG state, not on how rayon schedules the work.
    pub fn fit(
        data: &[f64],
        n_estimators: usize,
        max_samples: usize,
        contamination: f64,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(DetectorError::ModelFit("cannot fit on an empty window".into()));
        }
        if n_estimators == 0 || max_samples == 0 {
            return Err(DetectorError::ModelFit(
                "n_estimators and max_samples must be positive".into(),
            ));
        }
        if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
            return Err(DetectorError::ModelFit(format!(
                "non-finite training value {}",
                bad
            )));
        }

        let sample_size = cmp::min(max_samples, data.len());
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let seeds: Vec<u64> = (0..n_estimators).map(|_| rng.gen()).collect();

        let trees: Vec<Node> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut tree_rng = StdRng::seed_from_u64(seed);
                let sampled: Vec<f64> = (0..sample_size)
                    .map(|_| data[tree_rng.gen_range(0..data.len())])
                    .collect();
                Self::build_tree(&sampled, 0, height_limit, &mut tree_rng)
            })
            .collect();

        let mut forest = IsolationForest {
            trees,
            sample_size,
            offset: 0.0,
        };

        let mut train_scores: Vec<f64> = data.iter().map(|&x| forest.raw_score(x)).collect();
        forest.offset = quantile(&mut train_scores, 1.0 - contamination);
        Ok(forest)
    }

    /// `2^(-E[h(x)] / c(psi))`, in `(0, 1]`.
    pub fn raw_score(&self, x: f64) -> f64 {
        let total: f64 = self.trees.iter().map(|t| Self::path_length(t, x, 0)).sum();
        let avg_path_length = total / self.trees.len() as f64;
        let expected_path_length = average_path_length(self.sample_size);
        if expected_path_length > 0.0 {
            2.0f64.powf(-avg_path_length / expected_path_length)
        } else {
            1.0
        }
    }

    /// Raw score minus the contamination offset.
    pub fn score(&self, x: f64) -> f64 {
        self.raw_score(x) - self.offset
    }

    /// Score and outlier flag; `x` is an outlier iff its score is above zero.
    pub fn classify(&self, x: f64) -> (f64, bool) {
        let score = self.score(x);
        (score, score > 0.0)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

// Linear-interpolated quantile, `q` in [0, 1]. Sorts `values` in place.
fn quantile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}
