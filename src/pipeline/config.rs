//! Pipeline configuration

use serde::{Deserialize, Serialize};

use crate::metrics_index::MetricsIndexConfig;
use crate::preprocessing::PreprocessingConfig;
use crate::tracking::TrackingConfig;
use crate::training::ParamGrid;

/// Name of the cross-validated accuracy metric on the tracker
pub const BEST_CV_ACCURACY_METRIC: &str = "best_cv_accuracy";

/// Name of the hold-out accuracy metric on the tracker
pub const HOLDOUT_ACCURACY_METRIC: &str = "holdout_accuracy";

/// Settings for one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub tracking: TrackingConfig,
    pub metrics_index: MetricsIndexConfig,
    pub preprocessing: PreprocessingConfig,
    pub grid: ParamGrid,
    /// Seed for resampling, splitting and every forest
    pub random_state: u64,
    /// Fraction of the resampled rows held out for testing
    pub test_size: f64,
    pub cv_folds: usize,
    /// ADASYN neighbourhood size
    pub k_neighbors: usize,
    /// Worker threads for the grid search; all cores when unset
    pub n_jobs: Option<usize>,
    /// Run-relative directory the model is logged under
    pub artifact_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            metrics_index: MetricsIndexConfig::default(),
            preprocessing: PreprocessingConfig::default(),
            grid: ParamGrid::lung_cancer_default(),
            random_state: 42,
            test_size: 0.2,
            cv_folds: 5,
            k_neighbors: 5,
            n_jobs: None,
            artifact_path: "model".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn with_metrics_index(mut self, metrics_index: MetricsIndexConfig) -> Self {
        self.metrics_index = metrics_index;
        self
    }

    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.random_state, 42);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.grid.len(), 48);
        assert_eq!(config.artifact_path, "model");
        assert!(config.n_jobs.is_none());
    }
}
