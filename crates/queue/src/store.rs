//! Directory-backed queue storage.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use loopwear_core::TenantId;
use loopwear_returns::ReturnStage;

use crate::record::QueuedReturnEvent;

const QUEUE_DIR: &str = "queue";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed queue record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl QueueError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Per-tenant durable event queue rooted at a data directory.
///
/// Layout: `<root>/<tenant>/queue/<uuid>.json`, one record per file. File
/// names are freshly generated UUIDs (never derived from record content, so
/// two events for the same session never collide).
#[derive(Debug, Clone)]
pub struct EventQueue {
    root: PathBuf,
}

impl EventQueue {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        self.root.join(tenant.as_str()).join(QUEUE_DIR)
    }

    /// Durably enqueue one return event for `tenant`.
    ///
    /// Creates the tenant's queue directory on first use. This is
    /// fire-and-forget storage: it is not transactional with any other
    /// write the producer performs.
    pub async fn write_event(
        &self,
        tenant: &TenantId,
        session_id: &str,
        stage: ReturnStage,
    ) -> Result<PathBuf, QueueError> {
        let dir = self.tenant_dir(tenant);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| QueueError::io(&dir, e))?;

        let path = dir.join(format!("{}.json", Uuid::now_v7()));
        let record = QueuedReturnEvent::new(session_id, stage);
        let bytes = serde_json::to_vec(&record).map_err(|e| QueueError::Malformed {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, bytes)
            .await
            .map_err(|e| QueueError::io(&path, e))?;
        Ok(path)
    }

    /// Enumerate tenants under the data root (subdirectory names).
    ///
    /// This is the one operation whose failure the callers treat as fatal:
    /// without it no tenant can be scanned at all.
    pub async fn tenants(&self) -> Result<Vec<TenantId>, QueueError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| QueueError::io(&self.root, e))?;

        let mut tenants = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| QueueError::io(&self.root, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| QueueError::io(entry.path(), e))?;
            if file_type.is_dir() {
                tenants.push(TenantId::new(entry.file_name().to_string_lossy()));
            }
        }
        tenants.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(tenants)
    }

    /// Pending record paths for `tenant`, in enumeration order.
    ///
    /// A tenant without a queue directory simply has nothing pending.
    pub async fn pending(&self, tenant: &TenantId) -> Result<Vec<PathBuf>, QueueError> {
        let dir = self.tenant_dir(tenant);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(QueueError::io(&dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| QueueError::io(&dir, e))?
        {
            if entry
                .file_type()
                .await
                .map_err(|e| QueueError::io(entry.path(), e))?
                .is_file()
            {
                paths.push(entry.path());
            }
        }
        // UUIDv7 names are time-ordered, so sorting restores write order.
        paths.sort();
        Ok(paths)
    }

    /// Read and parse one record.
    pub async fn read(&self, path: &Path) -> Result<QueuedReturnEvent, QueueError> {
        let bytes = fs::read(path).await.map_err(|e| QueueError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| QueueError::Malformed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Best-effort delete. A record left behind is re-delivered and handled
    /// idempotently, so failures here are intentionally swallowed.
    pub async fn remove(&self, path: &Path) {
        let _ = fs::remove_file(path).await;
    }
}
