//! ADASYN (Adaptive Synthetic Sampling)

use crate::error::{PipelineError, Result};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// ADASYN adaptive synthetic sampling.
///
/// Minority samples surrounded by more foreign-class neighbours receive
/// proportionally more synthetic neighbours. Every minority class is
/// oversampled up to the majority class size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ADASYN {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: Option<u64>,
}

impl ADASYN {
    /// Create new ADASYN sampler
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum()
    }

    /// Indices (into `candidates`) of the k nearest candidates to `point`,
    /// skipping `point` itself. Ties go to the lower index.
    fn nearest(x: &Array2<f64>, point: usize, candidates: &[usize], k: usize) -> Vec<usize> {
        let mut distances: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .filter(|&(_, &row)| row != point)
            .map(|(pos, &row)| (pos, Self::squared_distance(x.row(point), x.row(row))))
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        distances.into_iter().take(k).map(|(pos, _)| pos).collect()
    }

    fn generate_sample(point: ArrayView1<f64>, neighbor: ArrayView1<f64>, rng: &mut StdRng) -> Vec<f64> {
        let gap: f64 = rng.gen();
        point
            .iter()
            .zip(neighbor.iter())
            .map(|(&p, &n)| p + gap * (n - p))
            .collect()
    }
}

impl Default for ADASYN {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for ADASYN {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(PipelineError::ResamplingError(
                "need at least 2 classes for ADASYN".to_string(),
            ));
        }

        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let counts = class_counts(y);
        let indices = class_indices(y);
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if counts.len() < 2 {
            return Err(PipelineError::ResamplingError(
                "need at least 2 classes for ADASYN".to_string(),
            ));
        }

        // Largest class; ties resolve to the smallest label.
        let (majority_class, majority_count) = counts
            .iter()
            .fold((0i64, 0usize), |best, (&class, &count)| {
                if count > best.1 { (class, count) } else { best }
            });

        let all_rows: Vec<usize> = (0..n_samples).collect();
        let k_all = self.k_neighbors.min(n_samples - 1);

        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (&class, &count) in counts.iter().filter(|(c, _)| **c != majority_class) {
            let g = majority_count.saturating_sub(count);
            if g == 0 {
                n_synthetic.insert(class, 0);
                continue;
            }

            if count < 2 {
                return Err(PipelineError::ResamplingError(format!(
                    "class {} has {} sample(s); at least 2 are needed to interpolate",
                    class, count
                )));
            }

            let minority_idx = &indices[&class];

            // Share of foreign-class neighbours around each minority sample
            let ratios: Vec<f64> = minority_idx
                .iter()
                .map(|&row| {
                    let neighbors = Self::nearest(x, row, &all_rows, k_all);
                    let foreign = neighbors.iter().filter(|&&nb| y[nb] != class).count();
                    foreign as f64 / k_all as f64
                })
                .collect();

            let sum_ratios: f64 = ratios.iter().sum();
            if sum_ratios == 0.0 {
                return Err(PipelineError::ResamplingError(format!(
                    "no sample of class {} has a neighbour from another class; \
                     ADASYN cannot weight the generation",
                    class
                )));
            }

            let samples_per_point: Vec<usize> = ratios
                .iter()
                .map(|&r| (r / sum_ratios * g as f64).round() as usize)
                .collect();

            let k_class = self.k_neighbors.min(count - 1);

            let mut generated = 0;
            for (pos, &n_new) in samples_per_point.iter().enumerate() {
                if n_new == 0 {
                    continue;
                }

                let row = minority_idx[pos];
                let neighbors = Self::nearest(x, row, minority_idx, k_class);

                for _ in 0..n_new {
                    let neighbor_row = minority_idx[neighbors[rng.gen_range(0..neighbors.len())]];
                    let sample = Self::generate_sample(x.row(row), x.row(neighbor_row), &mut rng);
                    synthetic_x.extend(sample);
                    synthetic_y.push(class);
                    generated += 1;
                }
            }

            debug!(class, original = count, generated, "ADASYN oversampled class");
            n_synthetic.insert(class, generated);
        }

        let n_new = synthetic_y.len();
        let synthetic = Array2::from_shape_vec((n_new, n_features), synthetic_x)?;
        let result_x = ndarray::concatenate(ndarray::Axis(0), &[x.view(), synthetic.view()])?;

        let mut all_y: Vec<i64> = y.to_vec();
        all_y.extend(synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}
