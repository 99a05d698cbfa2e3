//! Stratified cross-validation

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified K-Fold splitter (maintains class distribution, no shuffling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self::new(5)
    }
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Number of folds produced
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Folds receive each class in near-equal shares. Per-fold class quotas
    /// come from dealing the label-sorted samples round-robin; each class then
    /// fills its quotas in sample order (fold 0 first).
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits;
        let n_samples = y.len();
        if n_splits < 2 {
            return Err(PipelineError::ValidationError(
                "n_splits must be at least 2".to_string()
            ));
        }
        if n_samples < n_splits {
            return Err(PipelineError::ValidationError(
                format!("n_samples ({}) must be >= n_splits ({})", n_samples, n_splits)
            ));
        }

        let mut class_members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_members.entry(val.round() as i64).or_default().push(idx);
        }

        if class_members.values().all(|members| members.len() < n_splits) {
            return Err(PipelineError::ValidationError(format!(
                "n_splits ({}) cannot be greater than the number of members in each class",
                n_splits
            )));
        }

        let classes: Vec<i64> = class_members.keys().copied().collect();
        let sorted_labels: Vec<usize> = class_members
            .values()
            .enumerate()
            .flat_map(|(class_pos, members)| std::iter::repeat(class_pos).take(members.len()))
            .collect();

        // quotas[fold][class]
        let mut quotas = vec![vec![0usize; classes.len()]; n_splits];
        for (i, &class_pos) in sorted_labels.iter().enumerate() {
            quotas[i % n_splits][class_pos] += 1;
        }

        let mut test_fold = vec![0usize; n_samples];
        for (class_pos, members) in class_members.values().enumerate() {
            let assignment: Vec<usize> = (0..n_splits)
                .flat_map(|fold| std::iter::repeat(fold).take(quotas[fold][class_pos]))
                .collect();
            for (&idx, &fold) in members.iter().zip(assignment.iter()) {
                test_fold[idx] = fold;
            }
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| test_fold[i] == fold_idx);
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: 0.0,
                std_score: 0.0,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![
            0.0, 0.0, 0.0, 0.0, 0.0,
            1.0, 1.0, 1.0, 1.0, 1.0,
        ]);

        let splits = StratifiedKFold::new(5).split(&y).unwrap();

        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            assert_eq!(split.train_indices.len(), 8);
            let ones = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(ones, 1);
        }
        assert_eq!(splits[0].test_indices, vec![0, 5]);
    }

    #[test]
    fn test_stratified_k_fold_uneven_classes() {
        // 7 of class 0, 3 of class 1, interleaved
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let splits = StratifiedKFold::new(3).split(&y).unwrap();

        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for split in &splits {
            let ones = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(ones, 1);
            for idx in &split.test_indices {
                assert!(!split.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_stratified_too_many_splits() {
        let y = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);
        assert!(matches!(
            StratifiedKFold::new(3).split(&y),
            Err(PipelineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_stratified_needs_two_splits() {
        let y = Array1::from_vec(vec![0.0, 0.0, 1.0, 1.0]);
        assert!(StratifiedKFold::new(1).split(&y).is_err());
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.8, 1.0]);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert!((results.std_score - 0.1).abs() < 1e-12);
        assert_eq!(results.n_folds, 2);
    }
}
