//! Model artifact serialization

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::training::RandomForest;

/// Current artifact format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const MAGIC: &str = "LCRF";

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,
    /// Version of the crate that produced the artifact
    pub version: String,
    /// Training timestamp (RFC 3339, UTC)
    pub trained_at: String,
    /// Feature names in matrix column order
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    /// Model type
    pub model_type: String,
    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
    /// Training metrics
    pub metrics: BTreeMap<String, f64>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: "RandomForest".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now().to_rfc3339(),
            feature_names: Vec::new(),
            target_name: "target".to_string(),
            model_type: "random_forest_classifier".to_string(),
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }
}

impl ModelMetadata {
    /// Create new metadata with name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set feature names
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    /// Set target name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    /// Replace all hyperparameters
    pub fn with_hyperparameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.hyperparameters = params;
        self
    }

    /// Add metric
    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// A fitted forest plus its metadata, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    magic: String,
    format_version: u32,
    pub metadata: ModelMetadata,
    pub model: RandomForest,
}

impl ModelArtifact {
    /// Wrap a fitted model
    pub fn new(model: RandomForest, metadata: ModelMetadata) -> Result<Self> {
        if !model.is_fitted() {
            return Err(PipelineError::ModelNotFitted);
        }
        if !metadata.feature_names.is_empty() && metadata.feature_names.len() != model.n_features() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} feature names", model.n_features()),
                actual: format!("{} feature names", metadata.feature_names.len()),
            });
        }

        Ok(Self {
            magic: MAGIC.to_string(),
            format_version: ARTIFACT_FORMAT_VERSION,
            metadata,
            model,
        })
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Serialize to pretty JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to serialize model: {}", e))
        })
    }

    /// Write the artifact, replacing any existing file. The parent
    /// directory must already exist.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_json_bytes()?;

        let file = File::create(path).map_err(|e| {
            PipelineError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create {}: {}", path.display(), e),
            ))
        })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;

        Ok(())
    }

    /// Read an artifact written by [`ModelArtifact::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PipelineError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        let reader = BufReader::new(file);

        let artifact: ModelArtifact = serde_json::from_reader(reader).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to read model JSON: {}", e))
        })?;

        if artifact.magic != MAGIC {
            return Err(PipelineError::SerializationError(format!(
                "{} is not a model artifact",
                path.display()
            )));
        }
        if artifact.format_version > ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::SerializationError(format!(
                "artifact format {} is newer than supported format {}",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        Ok(artifact)
    }
}
