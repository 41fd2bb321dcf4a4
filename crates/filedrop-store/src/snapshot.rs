//! Snapshot persistence port
//!
//! This module defines the `SnapshotStore` trait the registry persists
//! through, and its JSON flat-file implementation. The write path replaces
//! the snapshot atomically at the filesystem's granularity: the new contents
//! go to a temp file in the same directory, which is then renamed over the
//! target, so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use filedrop_core::models::FileRecord;
use filedrop_core::FileId;

/// Snapshot operation errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot read failed: {0}")]
    ReadFailed(String),

    #[error("Snapshot write failed: {0}")]
    WriteFailed(String),

    #[error("Snapshot decode failed: {0}")]
    DecodeFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<SnapshotError> for filedrop_core::AppError {
    fn from(err: SnapshotError) -> Self {
        filedrop_core::AppError::Snapshot(err.to_string())
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Persistence port for the registry.
///
/// `load` distinguishes a missing snapshot (`Ok(None)`, a normal first start)
/// from an unreadable one (`Err`), so the caller can log the right notice
/// before degrading to an empty registry either way.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> SnapshotResult<Option<Vec<(FileId, FileRecord)>>>;

    async fn persist(&self, entries: &[(FileId, FileRecord)]) -> SnapshotResult<()>;
}

/// JSON flat-file snapshot implementation
#[derive(Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSnapshot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshot {
    async fn load(&self) -> SnapshotResult<Option<Vec<(FileId, FileRecord)>>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SnapshotError::ReadFailed(format!(
                    "Failed to read snapshot {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let entries: Vec<(FileId, FileRecord)> = serde_json::from_slice(&data).map_err(|e| {
            SnapshotError::DecodeFailed(format!(
                "Failed to decode snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(entries))
    }

    async fn persist(&self, entries: &[(FileId, FileRecord)]) -> SnapshotResult<()> {
        self.ensure_parent_dir().await?;

        let data = serde_json::to_vec(entries)
            .map_err(|e| SnapshotError::WriteFailed(format!("Failed to encode snapshot: {}", e)))?;

        let tmp = self.tmp_path();

        let mut file = fs::File::create(&tmp).await.map_err(|e| {
            SnapshotError::WriteFailed(format!("Failed to create {}: {}", tmp.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            SnapshotError::WriteFailed(format!("Failed to write {}: {}", tmp.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            SnapshotError::WriteFailed(format!("Failed to sync {}: {}", tmp.display(), e))
        })?;

        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(|e| {
            SnapshotError::WriteFailed(format!(
                "Failed to replace {} with {}: {}",
                self.path.display(),
                tmp.display(),
                e
            ))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Snapshot persisted"
        );

        Ok(())
    }
}
