//! Audio source backed by the local filesystem.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{AudioBlob, AudioSource, HostError};

/// Reads audio straight from disk.
///
/// No content type is declared, so files without an extension fall back to the
/// default format.
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    root: Option<PathBuf>,
}

impl LocalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative references against `root` instead of the working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

#[async_trait]
impl AudioSource for LocalFiles {
    async fn fetch(&self, path: &str) -> Result<Option<AudioBlob>, HostError> {
        let resolved = self.resolve(path);
        match tokio::fs::read(&resolved).await {
            Ok(bytes) => Ok(Some(AudioBlob {
                bytes,
                content_type: None,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Audio file not found: {}", resolved.display());
                Ok(None)
            }
            Err(e) => Err(HostError::Io(e)),
        }
    }
}
