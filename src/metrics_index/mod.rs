//! Metrics index
//!
//! Mirrors a training summary into an Elasticsearch-compatible document
//! index. Indexing is best effort: failures are logged and reported as an
//! [`IndexOutcome`], never as an error.

mod client;

pub use client::MetricsIndexClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::training::RandomForestParams;

/// Index host used when `METRICS_INDEX_URL` is not set
pub const DEFAULT_INDEX_URL: &str = "http://host.docker.internal:9200";

pub const DEFAULT_INDEX_NAME: &str = "mlflow-metrics";

/// Index connection and document settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsIndexConfig {
    pub url: String,
    pub index: String,
    /// `model` field of every document
    pub model_name: String,
    /// `source` field of every document
    pub source: String,
    pub timeout_secs: Option<u64>,
    pub enabled: bool,
}

impl Default for MetricsIndexConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("METRICS_INDEX_URL").unwrap_or_else(|_| DEFAULT_INDEX_URL.to_string()),
            index: DEFAULT_INDEX_NAME.to_string(),
            model_name: "RandomForest".to_string(),
            source: "mlflow-rf-training".to_string(),
            timeout_secs: Some(10),
            enabled: true,
        }
    }
}

impl MetricsIndexConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Document written once per training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub accuracy: f64,
    pub params: RandomForestParams,
    pub source: String,
}

impl MetricsDocument {
    /// Stamp a document with the current UTC time
    pub fn new(config: &MetricsIndexConfig, accuracy: f64, params: RandomForestParams) -> Self {
        Self {
            timestamp: Utc::now(),
            model: config.model_name.clone(),
            accuracy,
            params,
            source: config.source.clone(),
        }
    }
}

/// What happened to the metrics document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    /// Stored under the returned document id
    Indexed { id: String },
    /// Ping failed; nothing was sent
    Unreachable,
    /// Reachable but indexing failed
    Failed { reason: String },
    /// Indexing switched off in config
    Disabled,
}
