//! Synthetic minority oversampling
//!
//! Rebalances a skewed label distribution before training:
//! - ADASYN (Adaptive Synthetic Sampling)

mod adasyn;

pub use adasyn::ADASYN;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features (originals first, synthetic rows appended)
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Number of synthetic samples generated per oversampled class
    pub n_synthetic: BTreeMap<i64, usize>,
}

impl ResampleResult {
    /// Total number of generated rows
    pub fn total_synthetic(&self) -> usize {
        self.n_synthetic.values().sum()
    }
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Get class distribution, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Minority:majority count ratio (1.0 means perfectly balanced)
pub fn imbalance_ratio(y: &Array1<i64>) -> f64 {
    let counts = class_counts(y);
    let max = counts.values().copied().max().unwrap_or(0);
    let min = counts.values().copied().min().unwrap_or(0);
    if max == 0 {
        return 0.0;
    }
    min as f64 / max as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_counts_ordered() {
        let y = array![2i64, 0, 2, 1, 2];
        let counts: Vec<(i64, usize)> = class_counts(&y).into_iter().collect();
        assert_eq!(counts, vec![(0, 1), (1, 1), (2, 3)]);
    }

    #[test]
    fn test_class_indices() {
        let y = array![1i64, 0, 1];
        let indices = class_indices(&y);
        assert_eq!(indices[&1], vec![0, 2]);
        assert_eq!(indices[&0], vec![1]);
    }

    #[test]
    fn test_imbalance_ratio() {
        let y = array![0i64, 0, 0, 1];
        assert!((imbalance_ratio(&y) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(imbalance_ratio(&Array1::<i64>::zeros(0)), 0.0);
    }
}
