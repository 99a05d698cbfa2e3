//! Elasticsearch-compatible document client

use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{IndexOutcome, MetricsDocument, MetricsIndexConfig};
use crate::error::{PipelineError, Result};

#[derive(Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

/// Client for one index
#[derive(Debug, Clone)]
pub struct MetricsIndexClient {
    http: reqwest::Client,
    config: MetricsIndexConfig,
}

impl MetricsIndexClient {
    pub fn new(config: MetricsIndexConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| PipelineError::IndexError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &MetricsIndexConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// `true` when the cluster answers `HEAD /` with a success status
    pub async fn ping(&self) -> bool {
        match self.http.head(format!("{}/", self.base_url())).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Store the document, returning the id the index assigned
    pub async fn index_document(&self, doc: &MetricsDocument) -> Result<String> {
        let url = format!("{}/{}/_doc", self.base_url(), self.config.index);
        let response = self
            .http
            .post(&url)
            .json(doc)
            .send()
            .await
            .map_err(|e| PipelineError::IndexError(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::IndexError(format!("POST {} returned {}: {}", url, status, body)));
        }

        let parsed: IndexResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::IndexError(format!("invalid index response: {}", e)))?;
        Ok(parsed.id)
    }

    /// Ping, then index. Never fails; every problem is logged and folded
    /// into the returned outcome.
    pub async fn log_best_effort(&self, doc: &MetricsDocument) -> IndexOutcome {
        if !self.config.enabled {
            return IndexOutcome::Disabled;
        }

        info!(url = %self.config.url, "Connecting to metrics index");
        if !self.ping().await {
            warn!(url = %self.config.url, "Metrics index unreachable, skipping document");
            return IndexOutcome::Unreachable;
        }

        match self.index_document(doc).await {
            Ok(id) => {
                info!(index = %self.config.index, id = %id, "Logged metrics document");
                IndexOutcome::Indexed { id }
            }
            Err(e) => {
                warn!(index = %self.config.index, error = %e, "Failed to index metrics document");
                IndexOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::RandomForestParams;

    #[tokio::test]
    async fn test_unreachable_index() {
        let config = MetricsIndexConfig::default()
            .with_url("http://127.0.0.1:9")
            .with_timeout_secs(2);
        let client = MetricsIndexClient::new(config.clone()).unwrap();

        assert!(!client.ping().await);
        let doc = MetricsDocument::new(&config, 0.5, RandomForestParams::default());
        assert_eq!(client.log_best_effort(&doc).await, IndexOutcome::Unreachable);
    }

    #[tokio::test]
    async fn test_disabled_skips_network() {
        let config = MetricsIndexConfig::default().with_url("http://127.0.0.1:9").disabled();
        let client = MetricsIndexClient::new(config.clone()).unwrap();
        let doc = MetricsDocument::new(&config, 0.5, RandomForestParams::default());
        assert_eq!(client.log_best_effort(&doc).await, IndexOutcome::Disabled);
    }
}
