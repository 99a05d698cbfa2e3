//! Experiment tracking
//!
//! Client for an experiment tracker speaking the MLflow REST API 2.0:
//! experiments, runs, params, metrics, tags and run artifacts.

mod client;
mod storage;

pub use client::{ActiveRun, RunStatus, TrackingClient};
pub use storage::ArtifactStore;

use serde::{Deserialize, Serialize};

/// Tracker used when `MLFLOW_TRACKING_URI` is not set
pub const DEFAULT_TRACKING_URI: &str = "http://127.0.0.1:5000";

/// Experiment used when `MLFLOW_EXPERIMENT_NAME` is not set
pub const DEFAULT_EXPERIMENT_NAME: &str = "Lung Cancer Prediction - Random Forest";

/// Tracker connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Base URL of the tracking server
    pub tracking_uri: String,
    /// Experiment the run is recorded under (created when missing)
    pub experiment_name: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracking_uri: std::env::var("MLFLOW_TRACKING_URI")
                .unwrap_or_else(|_| DEFAULT_TRACKING_URI.to_string()),
            experiment_name: std::env::var("MLFLOW_EXPERIMENT_NAME")
                .unwrap_or_else(|_| DEFAULT_EXPERIMENT_NAME.to_string()),
            timeout_secs: None,
        }
    }
}

impl TrackingConfig {
    pub fn with_tracking_uri(mut self, uri: impl Into<String>) -> Self {
        self.tracking_uri = uri.into();
        self
    }

    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = name.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}
