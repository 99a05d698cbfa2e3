//! Model export and serialization module
//!
//! Persists the fitted forest together with the metadata needed to use it:
//! feature order, target name, hyperparameters and scores. The on-disk
//! format is JSON.

mod serializer;

pub use serializer::{ModelArtifact, ModelMetadata, ARTIFACT_FORMAT_VERSION};
