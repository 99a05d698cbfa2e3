//! lungcancer-rf - Random-forest training pipeline for the lung cancer survey
//!
//! Loads the survey CSV, cleans and encodes it, rebalances the classes with
//! ADASYN, grid-searches a random forest with stratified cross-validation,
//! persists the best model and records the run in an MLflow-compatible
//! tracker, mirroring a summary into a metrics index.
//!
//! # Modules
//!
//! ## Data
//! - [`utils`] - CSV loading and file inspection
//! - [`preprocessing`] - Deduplication, encoding, recoding, feature engineering
//! - [`synthetic`] - Minority oversampling (ADASYN)
//!
//! ## Modelling
//! - [`training`] - Decision trees, random forests, cross-validation, grid search
//! - [`export`] - Model artifact serialization
//!
//! ## Run recording
//! - [`tracking`] - MLflow REST client
//! - [`metrics_index`] - Best-effort document index
//!
//! ## Orchestration
//! - [`pipeline`] - The end-to-end training procedure
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod preprocessing;
pub mod synthetic;
pub mod utils;

// Modelling
pub mod training;
pub mod export;

// Run recording
pub mod tracking;
pub mod metrics_index;

// Orchestration
pub mod pipeline;
pub mod cli;

pub use error::{PipelineError, Result};
pub use pipeline::{train_model, PipelineConfig, TrainingPipeline, TrainingSummary};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Data
    pub use crate::preprocessing::{FeatureSet, PreprocessingConfig, Preprocessor};
    pub use crate::synthetic::{Sampler, ADASYN};
    pub use crate::utils::DataLoader;

    // Modelling
    pub use crate::training::{
        accuracy_score, train_test_split, GridSearchCV, ParamGrid, RandomForest, RandomForestParams,
    };
    pub use crate::export::{ModelArtifact, ModelMetadata};

    // Run recording
    pub use crate::tracking::{TrackingClient, TrackingConfig};
    pub use crate::metrics_index::{IndexOutcome, MetricsIndexClient, MetricsIndexConfig};

    // Orchestration
    pub use crate::pipeline::{train_model, PipelineConfig, TrainingPipeline, TrainingSummary};
}
