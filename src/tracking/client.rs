//! MLflow REST client

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use super::storage::ArtifactStore;
use super::TrackingConfig;
use crate::error::{PipelineError, Result};
use crate::export::ModelArtifact;

/// Terminal run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Handle to an open run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRun {
    pub run_id: String,
    pub experiment_id: String,
    pub artifact_uri: String,
}

#[derive(Deserialize)]
struct GetExperimentResponse {
    experiment: ExperimentInfo,
}

#[derive(Deserialize)]
struct ExperimentInfo {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Deserialize)]
struct CreateRunResponse {
    run: RunPayload,
}

#[derive(Deserialize)]
struct RunPayload {
    info: RunInfo,
}

#[derive(Deserialize)]
struct RunInfo {
    run_id: String,
    experiment_id: String,
    #[serde(default)]
    artifact_uri: String,
}

#[derive(Serialize)]
struct KeyValue<'a> {
    key: &'a str,
    value: &'a str,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> PipelineError {
    PipelineError::TrackingError(format!("request to {} failed: {}", endpoint, err))
}

/// Client for one tracking server
#[derive(Debug, Clone)]
pub struct TrackingClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrackingClient {
    /// Build a client; no request is sent yet
    pub fn new(config: &TrackingConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| PipelineError::TrackingError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.tracking_uri.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.base_url, endpoint)
    }

    async fn check(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PipelineError::TrackingError(format!(
            "{} returned {}: {}",
            endpoint, status, body
        )))
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<R> {
        let response = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;
        let response = Self::check(endpoint, response).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| PipelineError::TrackingError(format!("invalid {} response: {}", endpoint, e)))
    }

    /// Experiment id for `name`, if it exists
    pub async fn get_experiment_by_name(&self, name: &str) -> Result<Option<String>> {
        let endpoint = "experiments/get-by-name";
        let response = self
            .http
            .get(self.url(endpoint))
            .query(&[("experiment_name", name)])
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(endpoint, response).await?;
        let parsed: GetExperimentResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::TrackingError(format!("invalid {} response: {}", endpoint, e)))?;
        Ok(Some(parsed.experiment.experiment_id))
    }

    /// Experiment id for `name`, creating the experiment when missing
    pub async fn get_or_create_experiment(&self, name: &str) -> Result<String> {
        if let Some(id) = self.get_experiment_by_name(name).await? {
            debug!(experiment = name, experiment_id = %id, "Using existing experiment");
            return Ok(id);
        }

        let created: CreateExperimentResponse = self
            .post("experiments/create", &json!({ "name": name }))
            .await?;
        info!(experiment = name, experiment_id = %created.experiment_id, "Created experiment");
        Ok(created.experiment_id)
    }

    /// Open a run under `experiment_id`
    pub async fn create_run(&self, experiment_id: &str) -> Result<ActiveRun> {
        let body = json!({
            "experiment_id": experiment_id,
            "start_time": now_millis(),
            "tags": [
                { "key": "mlflow.source.name", "value": env!("CARGO_PKG_NAME") },
                { "key": "mlflow.source.type", "value": "LOCAL" },
            ],
        });
        let created: CreateRunResponse = self.post("runs/create", &body).await?;
        let info = created.run.info;

        info!(run_id = %info.run_id, experiment_id = %info.experiment_id, "Opened tracking run");
        Ok(ActiveRun {
            run_id: info.run_id,
            experiment_id: info.experiment_id,
            artifact_uri: info.artifact_uri,
        })
    }

    /// Log all params in one batch request
    pub async fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        let params: Vec<KeyValue<'_>> = params
            .iter()
            .map(|(key, value)| KeyValue { key, value })
            .collect();
        let body = json!({
            "run_id": run_id,
            "params": params,
            "metrics": [],
            "tags": [],
        });
        self.post::<_, serde_json::Value>("runs/log-batch", &body).await?;
        Ok(())
    }

    pub async fn log_metric(&self, run_id: &str, key: &str, value: f64) -> Result<()> {
        let body = json!({
            "run_id": run_id,
            "key": key,
            "value": value,
            "timestamp": now_millis(),
            "step": 0,
        });
        self.post::<_, serde_json::Value>("runs/log-metric", &body).await?;
        Ok(())
    }

    pub async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        let body = json!({ "run_id": run_id, "key": key, "value": value });
        self.post::<_, serde_json::Value>("runs/set-tag", &body).await?;
        Ok(())
    }

    /// Store `bytes` as `artifact_path/file_name` in the run's artifact store
    pub async fn log_artifact(
        &self,
        run: &ActiveRun,
        artifact_path: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let store = ArtifactStore::from_uri(&run.artifact_uri, &self.base_url)?;
        let location = store.location(artifact_path, file_name);

        match &store {
            ArtifactStore::Http { .. } => {
                let endpoint = "mlflow-artifacts/artifacts";
                let response = self
                    .http
                    .put(&location)
                    .body(bytes)
                    .send()
                    .await
                    .map_err(|e| transport_error(endpoint, e))?;
                Self::check(endpoint, response).await?;
            }
            ArtifactStore::Local { root } => {
                ArtifactStore::write_local(root, artifact_path, file_name, &bytes).await?;
            }
        }

        debug!(run_id = %run.run_id, location = %location, "Logged artifact");
        Ok(())
    }

    /// Upload the model as `artifact_path/model.json` with an `MLmodel`
    /// descriptor, and record it in the run's model history tag.
    pub async fn log_model(&self, run: &ActiveRun, artifact_path: &str, artifact: &ModelArtifact) -> Result<()> {
        let created = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();

        self.log_artifact(run, artifact_path, "model.json", artifact.to_json_bytes()?)
            .await?;

        let descriptor = MlModel::new(run, artifact_path, artifact, &created);
        self.log_artifact(run, artifact_path, "MLmodel", descriptor.to_yaml()?.into_bytes())
            .await?;

        let history = json!([{
            "run_id": run.run_id,
            "artifact_path": artifact_path,
            "utc_time_created": created,
            "flavors": descriptor.flavors,
        }]);
        self.set_tag(&run.run_id, "mlflow.log-model.history", &history.to_string())
            .await?;

        info!(run_id = %run.run_id, artifact_path, "Logged model");
        Ok(())
    }

    /// Close a run with a terminal status
    pub async fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let body = json!({
            "run_id": run_id,
            "status": status.as_str(),
            "end_time": now_millis(),
        });
        self.post::<_, serde_json::Value>("runs/update", &body).await?;
        debug!(run_id, status = status.as_str(), "Closed tracking run");
        Ok(())
    }
}

/// Contents of the `MLmodel` file written next to the model
#[derive(Debug, Serialize)]
struct MlModel<'a> {
    artifact_path: &'a str,
    flavors: Flavors<'a>,
    run_id: &'a str,
    signature_inputs: &'a [String],
    utc_time_created: &'a str,
}

#[derive(Debug, Serialize)]
struct Flavors<'a> {
    rust_json: RustJsonFlavor<'a>,
}

#[derive(Debug, Serialize)]
struct RustJsonFlavor<'a> {
    data: &'a str,
    format_version: u32,
    model_type: &'a str,
}

impl<'a> MlModel<'a> {
    fn new(run: &'a ActiveRun, artifact_path: &'a str, artifact: &'a ModelArtifact, created: &'a str) -> Self {
        Self {
            artifact_path,
            flavors: Flavors {
                rust_json: RustJsonFlavor {
                    data: "model.json",
                    format_version: artifact.format_version(),
                    model_type: &artifact.metadata.model_type,
                },
            },
            run_id: &run.run_id,
            signature_inputs: &artifact.metadata.feature_names,
            utc_time_created: created,
        }
    }

    fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| PipelineError::SerializationError(format!("Failed to write MLmodel: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_strings() {
        assert_eq!(RunStatus::Finished.as_str(), "FINISHED");
        assert_eq!(RunStatus::Failed.as_str(), "FAILED");
        assert_eq!(serde_json::to_string(&RunStatus::Failed).unwrap(), "\"FAILED\"");
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = TrackingConfig::default().with_tracking_uri("http://tracker:5000/");
        let client = TrackingClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://tracker:5000");
        assert_eq!(client.url("runs/create"), "http://tracker:5000/api/2.0/mlflow/runs/create");
    }

    fn fitted_artifact(features: Vec<String>) -> ModelArtifact {
        use crate::export::ModelMetadata;
        use crate::training::RandomForest;
        use ndarray::array;

        let x = array![[1.0, 1.0], [1.0, 2.0], [2.0, 1.0], [2.0, 2.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut forest = RandomForest::new_classifier(3).with_random_state(1);
        forest.fit(&x, &y).unwrap();
        ModelArtifact::new(forest, ModelMetadata::new("RandomForest").with_features(features)).unwrap()
    }

    #[test]
    fn test_mlmodel_descriptor_is_valid_yaml() {
        let features = vec!["ANXIETY".to_string(), "it's\nodd: #1".to_string()];
        let artifact = fitted_artifact(features.clone());
        let run = ActiveRun {
            run_id: "run: 7 # x".to_string(),
            experiment_id: "1".to_string(),
            artifact_uri: "mlflow-artifacts:/1/run/artifacts".to_string(),
        };

        let yaml = MlModel::new(&run, "model", &artifact, "2024-01-01 00:00:00.000000")
            .to_yaml()
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed["artifact_path"].as_str(), Some("model"));
        assert_eq!(parsed["run_id"].as_str(), Some("run: 7 # x"));
        assert_eq!(parsed["flavors"]["rust_json"]["data"].as_str(), Some("model.json"));
        assert_eq!(parsed["flavors"]["rust_json"]["format_version"].as_u64(), Some(1));
        let inputs: Vec<String> = serde_yaml::from_value(parsed["signature_inputs"].clone()).unwrap();
        assert_eq!(inputs, features);
    }

    #[tokio::test]
    async fn test_unreachable_tracker_is_an_error() {
        let config = TrackingConfig::default()
            .with_tracking_uri("http://127.0.0.1:9")
            .with_timeout_secs(2);
        let client = TrackingClient::new(&config).unwrap();
        let result = client.get_or_create_experiment("x").await;
        assert!(matches!(result, Err(PipelineError::TrackingError(_))));
    }
}
