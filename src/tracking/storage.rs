//! Artifact stores behind a run's `artifact_uri`

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Where a run's artifacts are written
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactStore {
    /// Proxied upload through the tracking server
    /// (`mlflow-artifacts:/...`)
    Http {
        /// `{tracking_uri}/api/2.0/mlflow-artifacts/artifacts`
        endpoint: String,
        /// Run root below the endpoint
        root: String,
    },
    /// Local directory (`file://...` or a bare path)
    Local { root: PathBuf },
}

impl ArtifactStore {
    /// Resolve a run's `artifact_uri`
    pub fn from_uri(artifact_uri: &str, tracking_uri: &str) -> Result<Self> {
        if let Some(rest) = artifact_uri.strip_prefix("mlflow-artifacts:") {
            // Optional authority: mlflow-artifacts://host:port/path
            let path = match rest.strip_prefix("//") {
                Some(with_host) => with_host.find('/').map_or("", |i| &with_host[i..]),
                None => rest,
            };
            return Ok(ArtifactStore::Http {
                endpoint: format!(
                    "{}/api/2.0/mlflow-artifacts/artifacts",
                    tracking_uri.trim_end_matches('/')
                ),
                root: path.trim_matches('/').to_string(),
            });
        }

        if let Some(path) = artifact_uri.strip_prefix("file://") {
            return Ok(ArtifactStore::Local { root: PathBuf::from(path) });
        }

        if artifact_uri.contains("://") || artifact_uri.is_empty() {
            return Err(PipelineError::TrackingError(format!(
                "unsupported artifact store: '{}'",
                artifact_uri
            )));
        }

        Ok(ArtifactStore::Local { root: PathBuf::from(artifact_uri) })
    }

    /// Target location of `artifact_path/file_name`
    pub fn location(&self, artifact_path: &str, file_name: &str) -> String {
        let relative = join_relative(artifact_path, file_name);
        match self {
            ArtifactStore::Http { endpoint, root } if root.is_empty() => {
                format!("{}/{}", endpoint, relative)
            }
            ArtifactStore::Http { endpoint, root } => format!("{}/{}/{}", endpoint, root, relative),
            ArtifactStore::Local { root } => root.join(relative).display().to_string(),
        }
    }

    /// Write a local artifact, creating directories as needed
    pub(crate) async fn write_local(root: &Path, artifact_path: &str, file_name: &str, bytes: &[u8]) -> Result<()> {
        let target = root.join(join_relative(artifact_path, file_name));
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }
}

fn join_relative(artifact_path: &str, file_name: &str) -> String {
    let dir = artifact_path.trim_matches('/');
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}
