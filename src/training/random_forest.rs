//! Random Forest classifier

use crate::error::{PipelineError, Result};
use super::decision_tree::{argmax_classes, unique_classes, DecisionTree};
use super::grid_search::RandomForestParams;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
    /// Sorted class labels
    classes: Vec<f64>,
}

/// Features drawn at each split: floor(sqrt(n_features)), at least one
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new_classifier(100)
    }
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Build an unfitted forest from a hyperparameter combination
    pub fn from_params(params: &RandomForestParams, random_state: Option<u64>) -> Self {
        let mut forest = Self::new_classifier(params.n_estimators)
            .with_min_samples_split(params.min_samples_split)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_bootstrap(params.bootstrap);
        forest.max_depth = params.max_depth;
        forest.random_state = random_state;
        forest
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Toggle bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 {
            return Err(PipelineError::TrainingError(
                "cannot fit a forest on an empty training set".to_string(),
            ));
        }

        if self.n_estimators == 0 {
            return Err(PipelineError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "a forest needs at least one tree".to_string(),
            });
        }

        let max_features = sqrt_features(n_features);
        let classes = unique_classes(y);
        let base_seed = self.random_state.unwrap_or_else(rand::random);

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let mut tree = DecisionTree::new_classifier()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(rng.gen());
                tree.max_depth = self.max_depth;

                if self.bootstrap {
                    let sample_indices: Vec<usize> = (0..n_samples)
                        .map(|_| rng.gen_range(0..n_samples))
                        .collect();
                    let x_boot = x.select(ndarray::Axis(0), &sample_indices);
                    let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();
                    tree.fit_with_classes(&x_boot, &y_boot, &classes)?;
                } else {
                    tree.fit_with_classes(x, y, &classes)?;
                }

                Ok(tree)
            })
            .collect::<Result<Vec<DecisionTree>>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.classes = classes;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (i, &val) in imp.iter().enumerate() {
                    if i < self.n_features {
                        total_importances[i] += val;
                    }
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Averaged class probabilities over all trees
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<Array2<f64>>>>()?;

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for tree_proba in &per_tree {
            proba += tree_proba;
        }
        proba /= per_tree.len() as f64;

        Ok(proba)
    }

    /// Predict class labels (soft voting, ties go to the smallest class)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(argmax_classes(&proba, &self.classes))
    }

    /// Sorted class labels seen at fit time
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Number of features seen at fit time
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Whether `fit` has completed
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_classifier() {
        let (x, y) = separable();

        let mut rf = RandomForest::new_classifier(10)
            .with_bootstrap(false)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_bootstrap_classifier() {
        let (x, y) = separable();

        let mut rf = RandomForest::new_classifier(25).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let accuracy = predictions.iter().zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count() as f64 / y.len() as f64;

        assert!(accuracy >= 0.8, "Accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_predict_proba() {
        let x = array![
            [0.0, 0.0],
            [1.0, 1.0],
        ];
        let y = array![0.0, 1.0];

        let mut rf = RandomForest::new_classifier(10)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();

        assert_eq!(proba.nrows(), 2);
        assert_eq!(proba.ncols(), 2);

        for i in 0..proba.nrows() {
            let row_sum: f64 = proba.row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-6, "Row {} sum: {}", i, row_sum);
        }
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = separable();

        let mut a = RandomForest::new_classifier(15).with_max_depth(3).with_random_state(7);
        let mut b = RandomForest::new_classifier(15).with_max_depth(3).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let probe = array![[0.5, 0.5], [0.05, 0.9], [1.15, 0.0]];
        assert_eq!(a.predict_proba(&probe).unwrap(), b.predict_proba(&probe).unwrap());
    }

    #[test]
    fn test_from_params() {
        let params = RandomForestParams {
            n_estimators: 3,
            max_depth: Some(5),
            min_samples_split: 5,
            min_samples_leaf: 2,
            bootstrap: false,
        };
        let rf = RandomForest::from_params(&params, Some(42));
        assert_eq!(rf.n_estimators, 3);
        assert_eq!(rf.max_depth, Some(5));
        assert_eq!(rf.min_samples_split, 5);
        assert_eq!(rf.min_samples_leaf, 2);
        assert!(!rf.bootstrap);
        assert_eq!(rf.random_state, Some(42));
    }

    #[test]
    fn test_sqrt_features() {
        assert_eq!(sqrt_features(12), 3);
        assert_eq!(sqrt_features(16), 4);
        assert_eq!(sqrt_features(1), 1);
        assert_eq!(sqrt_features(0), 1);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0],
            [4.0, 0.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut rf = RandomForest::new_classifier(10)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] >= importances[1]);
    }

    #[test]
    fn test_predict_before_fit() {
        let rf = RandomForest::new_classifier(10);
        assert!(matches!(rf.predict(&array![[0.0, 0.0]]), Err(PipelineError::ModelNotFitted)));
    }
}
