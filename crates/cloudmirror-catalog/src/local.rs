//! Local directory catalog
//!
//! Stores every object at `<root>/<remote_path>` and keeps the catalog
//! metadata as a JSON array of [`FileRecord`]s in `<root>/metadata.json`.
//! Used for development, tests and single-machine setups.
//!
//! ## Design Notes
//!
//! - Index updates are serialized through an async mutex and written with
//!   temp + rename, so concurrent `put`/`delete` calls never lose entries.
//! - Index entries that fail to parse or validate are skipped with a warning
//!   instead of failing the whole listing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use cloudmirror_core::domain::{FileRecord, OwnerId, RemotePath, UploadRequest};
use cloudmirror_core::ports::IRemoteCatalog;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::CatalogError;

/// Name of the metadata index inside the catalog root
pub const METADATA_FILE: &str = "metadata.json";

/// Catalog backed by a plain directory
#[derive(Debug)]
pub struct LocalCatalog {
    root: PathBuf,
    index_lock: Mutex<()>,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    fn object_path(&self, remote_path: &RemotePath) -> PathBuf {
        remote_path
            .segments()
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Reads every valid record from the index; a missing index is empty
    async fn read_index(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let path = self.index_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CatalogError::io(&path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<FileRecord>(entry) {
                Ok(record) => match record.validate() {
                    Ok(()) => records.push(record),
                    Err(e) => warn!(remote_path = %record.remote_path, error = %e, "skipping invalid catalog record"),
                },
                Err(e) => warn!(error = %e, "skipping malformed catalog record"),
            }
        }
        Ok(records)
    }

    async fn write_index(&self, records: &[FileRecord]) -> Result<(), CatalogError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CatalogError::io(&self.root, e))?;

        let path = self.index_path();
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        let data = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| CatalogError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| CatalogError::io(&path, e))?;
        Ok(())
    }

    async fn put_object(
        &self,
        local_src: &Path,
        request: &UploadRequest,
    ) -> Result<RemotePath, CatalogError> {
        let remote_path = request.remote_path()?;
        let object = self.object_path(&remote_path);

        if let Some(parent) = object.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::io(parent, e))?;
        }
        let size = tokio::fs::copy(local_src, &object)
            .await
            .map_err(|e| CatalogError::io(local_src, e))?;

        let record =
            request
                .clone()
                .into_record(remote_path.clone(), size, local_src, Utc::now());

        let _guard = self.index_lock.lock().await;
        let mut records = self.read_index().await?;
        match records.iter_mut().find(|r| r.remote_path == remote_path) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.write_index(&records).await?;

        info!(remote_path = %remote_path, size, "stored object");
        Ok(remote_path)
    }

    async fn delete_object(&self, remote_path: &RemotePath) -> Result<bool, CatalogError> {
        let object = self.object_path(remote_path);
        let removed_object = match tokio::fs::remove_file(&object).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(CatalogError::io(&object, e)),
        };

        let _guard = self.index_lock.lock().await;
        let mut records = self.read_index().await?;
        let before = records.len();
        records.retain(|r| &r.remote_path != remote_path);
        let removed_record = records.len() != before;
        if removed_record {
            self.write_index(&records).await?;
        }

        Ok(removed_object || removed_record)
    }
}

#[async_trait]
impl IRemoteCatalog for LocalCatalog {
    #[instrument(skip(self), fields(owner = %owner))]
    async fn list(&self, owner: &OwnerId) -> anyhow::Result<Vec<FileRecord>> {
        let records: Vec<FileRecord> = self
            .read_index()
            .await?
            .into_iter()
            .filter(|r| &r.owner_id == owner)
            .collect();
        debug!(count = records.len(), "listed catalog");
        Ok(records)
    }

    #[instrument(skip(self, local_dest), fields(remote_path = %remote_path))]
    async fn get(&self, remote_path: &RemotePath, local_dest: &Path) -> anyhow::Result<()> {
        let object = self.object_path(remote_path);
        match tokio::fs::copy(&object, local_dest).await {
            Ok(bytes) => {
                debug!(bytes, "copied object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !object.exists() => {
                Err(CatalogError::NotFound(remote_path.to_string()).into())
            }
            Err(e) => Err(CatalogError::io(local_dest, e).into()),
        }
    }

    async fn put(&self, local_src: &Path, request: &UploadRequest) -> anyhow::Result<RemotePath> {
        Ok(self.put_object(local_src, request).await?)
    }

    #[instrument(skip(self), fields(remote_path = %remote_path))]
    async fn delete(&self, remote_path: &RemotePath) -> anyhow::Result<bool> {
        let deleted = self.delete_object(remote_path).await?;
        debug!(deleted, "delete finished");
        Ok(deleted)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
