//! Remote catalog port (driven/secondary port)
//!
//! This module defines the interface to the object store that holds the
//! owner's files and their metadata. Every physical backend (REST object
//! store, local filesystem mirror) satisfies the same contract, so the rest
//! of the core never learns which one is in use.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - A failed `get` may leave a partially written destination behind; callers
//!   re-validate by size on the next pass.

use std::path::Path;

use crate::domain::{FileRecord, OwnerId, RemotePath, UploadRequest};

/// Port trait for remote catalog operations
#[async_trait::async_trait]
pub trait IRemoteCatalog: Send + Sync {
    /// Lists every file the catalog holds for `owner`
    ///
    /// Records that fail validation are skipped by the adapter.
    async fn list(&self, owner: &OwnerId) -> anyhow::Result<Vec<FileRecord>>;

    /// Streams the object at `remote_path` into `local_dest`, overwriting it
    ///
    /// The parent directory of `local_dest` must already exist.
    async fn get(&self, remote_path: &RemotePath, local_dest: &Path) -> anyhow::Result<()>;

    /// Stores `local_src` under the key derived from the request's
    /// `{owner, collection_name, filename}` and returns that key
    ///
    /// Putting the same triple again overwrites the existing object.
    async fn put(&self, local_src: &Path, request: &UploadRequest) -> anyhow::Result<RemotePath>;

    /// Deletes the object at `remote_path`
    ///
    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, remote_path: &RemotePath) -> anyhow::Result<bool>;

    /// Short name of the backend, used in status output and logs
    fn backend_name(&self) -> &'static str;
}
