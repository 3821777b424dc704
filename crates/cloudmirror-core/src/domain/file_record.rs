//! File records published by the remote catalog
//!
//! A [`FileRecord`] is produced by the upload side of the system and only
//! read by the sync core. Records cross the catalog boundary as JSON, so
//! deserialization accepts the field names the upload side historically
//! wrote (`user_id`, `channel_name`, `file_size`, ...) as aliases.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{is_safe_component, OwnerId, RemotePath};
use super::timestamp;

fn default_source() -> String {
    "unknown".to_string()
}

/// Metadata of one file stored in the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Account the file belongs to
    #[serde(alias = "user_id")]
    pub owner_id: OwnerId,
    /// Collection (folder) the file was filed under
    #[serde(alias = "channel_name")]
    pub collection_name: String,
    /// File name inside the collection
    pub filename: String,
    /// Size in bytes as recorded at upload time
    #[serde(alias = "file_size")]
    pub size: u64,
    /// MIME type recorded at upload time
    #[serde(alias = "file_type", default)]
    pub content_type: String,
    /// Unique key of the file within the catalog
    #[serde(alias = "cloud_path")]
    pub remote_path: RemotePath,
    /// Path of the file on the uploading machine, if known
    #[serde(default)]
    pub local_path: Option<String>,
    /// When the file was put into the catalog
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub uploaded_at: DateTime<Utc>,
    /// When the file was last mirrored, if ever
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub synced_at: Option<DateTime<Utc>>,
    /// Where the file originally came from
    #[serde(default = "default_source")]
    pub source: String,
    /// Identifier of the message the file was taken from
    #[serde(alias = "message_id", default)]
    pub origin_message_id: Option<String>,
    /// Link to the message the file was taken from
    #[serde(alias = "message_url", default)]
    pub origin_url: Option<String>,
}

impl FileRecord {
    /// Checks the record before it is allowed into a sync pass
    ///
    /// The collection name and filename become local path segments, so both
    /// must be single safe segments. The remote key must be the one derived
    /// from owner, collection and filename; otherwise the ledger key and the
    /// local destination would describe different files.
    ///
    /// # Errors
    /// Returns the first validation problem found
    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_safe_component(&self.collection_name) {
            return Err(DomainError::InvalidCollection(self.collection_name.clone()));
        }
        if !is_safe_component(&self.filename) {
            return Err(DomainError::InvalidFilename(self.filename.clone()));
        }
        let expected = RemotePath::derive(&self.owner_id, &self.collection_name, &self.filename)?;
        if expected != self.remote_path {
            return Err(DomainError::RemotePathMismatch {
                expected: expected.to_string(),
                actual: self.remote_path.to_string(),
            });
        }
        Ok(())
    }

    /// Resolves where this file lives under the local mirror root
    ///
    /// Layout is `<root>/<collection_name>/<filename>`.
    #[must_use]
    pub fn local_destination(&self, root: &Path) -> PathBuf {
        root.join(&self.collection_name).join(&self.filename)
    }
}

/// Metadata supplied when putting a new file into the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub owner_id: OwnerId,
    pub collection_name: String,
    pub filename: String,
    pub content_type: String,
    pub source: String,
    pub origin_message_id: Option<String>,
    pub origin_url: Option<String>,
}

impl UploadRequest {
    /// Creates a request with an unknown source and no origin message
    pub fn new(
        owner_id: OwnerId,
        collection_name: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            collection_name: collection_name.into(),
            filename: filename.into(),
            content_type: "application/octet-stream".to_string(),
            source: default_source(),
            origin_message_id: None,
            origin_url: None,
        }
    }

    /// Sets the MIME type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the source tag
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Deterministic catalog key for this upload
    ///
    /// # Errors
    /// Returns error if the collection or filename is not a safe segment
    pub fn remote_path(&self) -> Result<RemotePath, DomainError> {
        RemotePath::derive(&self.owner_id, &self.collection_name, &self.filename)
    }

    /// Builds the catalog record for a completed upload
    pub fn into_record(
        self,
        remote_path: RemotePath,
        size: u64,
        local_src: &Path,
        uploaded_at: DateTime<Utc>,
    ) -> FileRecord {
        FileRecord {
            owner_id: self.owner_id,
            collection_name: self.collection_name,
            filename: self.filename,
            size,
            content_type: self.content_type,
            remote_path,
            local_path: Some(local_src.display().to_string()),
            uploaded_at,
            synced_at: None,
            source: self.source,
            origin_message_id: self.origin_message_id,
            origin_url: self.origin_url,
        }
    }
}

/// A file selected for transfer, paired with its resolved local destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub record: FileRecord,
    pub destination: PathBuf,
}

impl TransferTask {
    /// Resolves the destination of `record` under `root`
    pub fn new(record: FileRecord, root: &Path) -> Self {
        let destination = record.local_destination(root);
        Self {
            record,
            destination,
        }
    }

    /// Catalog key of the file being transferred
    #[must_use]
    pub fn remote_path(&self) -> &RemotePath {
        &self.record.remote_path
    }
}
