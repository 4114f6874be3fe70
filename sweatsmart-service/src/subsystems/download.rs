//! Download sinks — where finished report bytes end up

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ExportError;

#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save `bytes` under `filename`, returning where they were written.
    /// On error nothing is left under `filename`.
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError>;
}

/// Writes reports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(ExportError::InvalidFilename(filename.to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(filename);
        let partial = self.dir.join(format!(".{filename}.part"));

        if let Err(e) = tokio::fs::write(&partial, &bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Report written");
        Ok(path)
    }
}
