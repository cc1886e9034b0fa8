//! Poller cursor persistence.
//!
//! The cursor records the last fully processed block so restarts resume
//! instead of replaying. Persistence failures are never fatal to
//! polling; callers log and continue with the in-memory value.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum CursorStoreError {
    #[error("cursor io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cursor file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Durable storage for the last processed block number.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Reads the persisted cursor; `None` when none was ever saved.
    async fn load(&self) -> Result<Option<u64>, CursorStoreError>;

    /// Persists `block` as the last fully processed block.
    async fn save(&self, block: u64) -> Result<(), CursorStoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorRecord {
    last_processed_block: u64,
}

/// JSON-file-backed cursor. Writes go through a temp file and rename so
/// a crash never leaves a truncated cursor behind.
#[derive(Debug)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn load(&self) -> Result<Option<u64>, CursorStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let record: CursorRecord = serde_json::from_slice(&raw)?;
        Ok(Some(record.last_processed_block))
    }

    async fn save(&self, block: u64) -> Result<(), CursorStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let record = CursorRecord {
            last_processed_block: block,
        };
        let body = serde_json::to_vec_pretty(&record)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        trace!(block, path = %self.path.display(), "cursor persisted");
        Ok(())
    }
}

/// In-memory cursor for tests and cursorless deployments.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    block: Mutex<Option<u64>>,
}

impl MemoryCursorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_block(block: u64) -> Self {
        Self {
            block: Mutex::new(Some(block)),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> Result<Option<u64>, CursorStoreError> {
        Ok(*self.block.lock())
    }

    async fn save(&self, block: u64) -> Result<(), CursorStoreError> {
        *self.block.lock() = Some(block);
        Ok(())
    }
}
