//! Launch account sources
//!
//! One source per protocol version. The catalogue treats a failing source
//! as empty, so sources report errors instead of swallowing them.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::raw::LaunchAccountEntry;
use super::state::LaunchVersion;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read account snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed account snapshot {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Account source unavailable: {0}")]
    Unavailable(String),
}

/// Lists and fetches launch accounts of a single protocol version.
#[async_trait]
pub trait AccountSource: Send + Sync {
    fn version(&self) -> LaunchVersion;

    /// Every launch account this source knows about.
    async fn list_all(&self) -> Result<Vec<LaunchAccountEntry>, SourceError>;

    /// One account by address. `Ok(None)` when it no longer exists.
    async fn fetch(&self, address: &str) -> Result<Option<Value>, SourceError>;
}

/// Source backed by an indexer snapshot: a JSON array of
/// `{ "publicKey": .., "account": {..} }` entries.
///
/// The file is re-read on every call so a refresh sees new snapshots.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    version: LaunchVersion,
    path: PathBuf,
}

impl JsonSnapshotSource {
    pub fn new(version: LaunchVersion, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Vec<LaunchAccountEntry>, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let entries: Vec<LaunchAccountEntry> =
            serde_json::from_slice(&bytes).map_err(|source| SourceError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            version = %self.version,
            path = %self.path.display(),
            count = entries.len(),
            "Loaded launch snapshot"
        );
        Ok(entries)
    }
}

#[async_trait]
impl AccountSource for JsonSnapshotSource {
    fn version(&self) -> LaunchVersion {
        self.version
    }

    async fn list_all(&self) -> Result<Vec<LaunchAccountEntry>, SourceError> {
        self.read_entries().await
    }

    async fn fetch(&self, address: &str) -> Result<Option<Value>, SourceError> {
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .find(|e| e.address == address)
            .map(|e| e.account))
    }
}
