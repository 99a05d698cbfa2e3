//! End-to-end training pipeline
//!
//! load → clean → feature-engineer → rebalance → split → grid-search →
//! persist → track → index

mod config;

pub use config::{PipelineConfig, BEST_CV_ACCURACY_METRIC, HOLDOUT_ACCURACY_METRIC};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::export::{ModelArtifact, ModelMetadata};
use crate::metrics_index::{IndexOutcome, MetricsDocument, MetricsIndexClient};
use crate::preprocessing::{FeatureSet, Preprocessor};
use crate::synthetic::{class_counts, imbalance_ratio, Sampler, ADASYN};
use crate::tracking::{ActiveRun, RunStatus, TrackingClient};
use crate::training::{accuracy_score, train_test_split, GridSearchCV, RandomForestParams, TrainTestSplit};
use crate::utils::DataLoader;

/// What a training run reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Best mean cross-validated accuracy
    pub accuracy: f64,
    pub best_params: RandomForestParams,
    /// Accuracy of the refitted best model on the held-out split
    pub holdout_accuracy: f64,
    pub run_id: String,
    pub index_outcome: IndexOutcome,
}

/// Train with the default configuration
pub async fn train_model(data_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Result<TrainingSummary> {
    TrainingPipeline::new(PipelineConfig::default())
        .run(data_path, model_path)
        .await
}

/// Runs the whole training procedure for one dataset
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train, persist the best model to `model_path` and record the run.
    ///
    /// Input, resampling, training and tracker failures are returned as
    /// errors; metrics-index failures only show up in the summary.
    pub async fn run(&self, data_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Result<TrainingSummary> {
        let start = Instant::now();
        let data_path = data_path.as_ref();
        let model_path = model_path.as_ref();

        let features = self.prepare(data_path)?;
        let (x, y) = self.resample(&features)?;
        let split = train_test_split(&x, &y, self.config.test_size, self.config.random_state)?;
        info!(train = split.n_train(), test = split.n_test(), "Split resampled data");

        let tracker = TrackingClient::new(&self.config.tracking)?;
        let experiment_id = tracker
            .get_or_create_experiment(&self.config.tracking.experiment_name)
            .await?;
        let run = tracker.create_run(&experiment_id).await?;

        match self.run_tracked(&tracker, &run, &features, split, model_path).await {
            Ok(summary) => {
                tracker.finish_run(&run.run_id, RunStatus::Finished).await?;
                info!(
                    accuracy = summary.accuracy,
                    holdout_accuracy = summary.holdout_accuracy,
                    best_params = %summary.best_params,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "Training complete"
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(close_err) = tracker.finish_run(&run.run_id, RunStatus::Failed).await {
                    warn!(run_id = %run.run_id, error = %close_err, "Could not mark run as failed");
                }
                Err(e)
            }
        }
    }

    fn prepare(&self, data_path: &Path) -> Result<FeatureSet> {
        let df = DataLoader::new().load_csv(data_path)?;
        info!(path = %data_path.display(), rows = df.height(), columns = df.width(), "Loaded dataset");

        let features = Preprocessor::with_config(self.config.preprocessing.clone()).run(&df)?;
        info!(
            samples = features.n_samples(),
            features = ?features.feature_names,
            "Preprocessed dataset"
        );
        Ok(features)
    }

    fn resample(&self, features: &FeatureSet) -> Result<(Array2<f64>, Array1<f64>)> {
        let before = imbalance_ratio(&features.y);
        let mut sampler = ADASYN::new()
            .with_k_neighbors(self.config.k_neighbors)
            .with_seed(self.config.random_state);
        let resampled = sampler.fit_resample(&features.x, &features.y)?;

        info!(
            synthetic = resampled.total_synthetic(),
            classes = ?class_counts(&resampled.y),
            ratio_before = before,
            ratio_after = imbalance_ratio(&resampled.y),
            "Rebalanced classes with ADASYN"
        );

        let y = resampled.y.mapv(|label| label as f64);
        Ok((resampled.x, y))
    }

    async fn run_tracked(
        &self,
        tracker: &TrackingClient,
        run: &ActiveRun,
        features: &FeatureSet,
        split: TrainTestSplit,
        model_path: &Path,
    ) -> Result<TrainingSummary> {
        let mut search = GridSearchCV::new(self.config.grid.clone())
            .with_cv(self.config.cv_folds)
            .with_random_state(self.config.random_state);
        if let Some(n_jobs) = self.config.n_jobs {
            search = search.with_n_jobs(n_jobs);
        }

        let TrainTestSplit { x_train, x_test, y_train, y_test } = split;
        let result = tokio::task::spawn_blocking(move || search.fit(&x_train, &y_train))
            .await
            .map_err(|e| PipelineError::TrainingError(format!("grid search task failed: {}", e)))??;

        let predictions = result.best_estimator.predict(&x_test)?;
        let holdout_accuracy = accuracy_score(&y_test, &predictions)?;
        let best_params = result.best_params.clone();
        let param_map = best_params.to_param_map();

        let metadata = ModelMetadata::new(self.config.metrics_index.model_name.clone())
            .with_features(features.feature_names.clone())
            .with_target(features.target_name.clone())
            .with_hyperparameters(param_map.clone())
            .add_metric(BEST_CV_ACCURACY_METRIC, result.best_score)
            .add_metric(HOLDOUT_ACCURACY_METRIC, holdout_accuracy);
        let artifact = ModelArtifact::new(result.best_estimator, metadata)?;
        artifact.save(model_path)?;
        info!(path = %model_path.display(), "Saved best model");

        tracker.log_params(&run.run_id, &param_map).await?;
        tracker
            .log_metric(&run.run_id, BEST_CV_ACCURACY_METRIC, result.best_score)
            .await?;
        tracker
            .log_metric(&run.run_id, HOLDOUT_ACCURACY_METRIC, holdout_accuracy)
            .await?;
        tracker
            .log_model(run, &self.config.artifact_path, &artifact)
            .await?;

        let index_outcome = self.index_summary(result.best_score, &best_params).await;

        Ok(TrainingSummary {
            accuracy: result.best_score,
            best_params,
            holdout_accuracy,
            run_id: run.run_id.clone(),
            index_outcome,
        })
    }

    async fn index_summary(&self, accuracy: f64, params: &RandomForestParams) -> IndexOutcome {
        let config = &self.config.metrics_index;
        if !config.enabled {
            return IndexOutcome::Disabled;
        }

        let doc = MetricsDocument::new(config, accuracy, params.clone());
        match MetricsIndexClient::new(config.clone()) {
            Ok(client) => client.log_best_effort(&doc).await,
            Err(e) => {
                warn!(error = %e, "Metrics index client unavailable");
                IndexOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics_index::MetricsIndexConfig;
    use crate::tracking::TrackingConfig;
    use std::io::Write;

    fn write_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("survey.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "GENDER,AGE,SMOKING,YELLOW_FINGERS,ANXIETY,SHORTNESS OF BREATH,LUNG_CANCER").unwrap();
        writeln!(file, "M,60,1,2,2,1,YES").unwrap();
        writeln!(file, "F,50,2,1,1,2,NO").unwrap();
        writeln!(file, "F,55,2,1,2,2,NO").unwrap();
        path
    }

    #[tokio::test]
    async fn test_resampling_failure_precedes_tracker() {
        // A single positive row leaves ADASYN nothing to interpolate.
        let dir = tempfile::tempdir().unwrap();
        let data = write_csv(dir.path());
        let model = dir.path().join("model.json");

        let config = PipelineConfig::default()
            .with_tracking(TrackingConfig::default().with_tracking_uri("http://127.0.0.1:9"))
            .with_metrics_index(MetricsIndexConfig::default().disabled());
        let result = TrainingPipeline::new(config).run(&data, &model).await;

        assert!(matches!(result, Err(PipelineError::ResamplingError(_))));
        assert!(!model.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrainingPipeline::new(PipelineConfig::default())
            .run(dir.path().join("absent.csv"), dir.path().join("model.json"))
            .await;
        assert!(matches!(result, Err(PipelineError::DataError(_))));
    }
}
