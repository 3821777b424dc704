//! Durable sync ledger
//!
//! [`SyncState`] records which remote files have been mirrored locally and
//! which transfers failed. Its JSON shape is the on-disk format of the state
//! file:
//!
//! ```json
//! {
//!   "last_sync": "2026-03-01T10:00:00Z",
//!   "synced_files": { "u1/news/a.mp4": {"local_path": "...", "synced_at": "...", "size": 10} },
//!   "failed_downloads": { "u1/news/b.mp4": {"filename": "b.mp4", "failed_at": "...", "retry_count": 1} },
//!   "total_synced": 1,
//!   "total_size": 10
//! }
//! ```
//!
//! ## Invariants
//!
//! - A remote path is in at most one of `synced_files` / `failed_downloads`.
//! - `total_synced == synced_files.len()` and `total_size` is the sum of the
//!   recorded sizes.
//! - `retry_count` grows by exactly one per consecutive failure.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemotePath;
use super::timestamp;

/// A file that has been mirrored locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedFile {
    pub local_path: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub synced_at: DateTime<Utc>,
    pub size: u64,
}

/// A file whose transfer failed at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDownload {
    pub filename: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub failed_at: DateTime<Utc>,
    pub retry_count: u32,
}

/// Per-owner ledger of sync outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub synced_files: BTreeMap<String, SyncedFile>,
    #[serde(default)]
    pub failed_downloads: BTreeMap<String, FailedDownload>,
    #[serde(default)]
    pub total_synced: u64,
    #[serde(default)]
    pub total_size: u64,
}

impl SyncState {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the file has already been mirrored
    pub fn is_synced(&self, remote_path: &RemotePath) -> bool {
        self.synced_files.contains_key(remote_path.as_str())
    }

    /// Records a successful mirror of `remote_path`
    ///
    /// Replaces any previous entry for the same path, drops its failure
    /// record, and keeps the totals consistent with the map.
    pub fn mark_synced(
        &mut self,
        remote_path: &RemotePath,
        local_path: &Path,
        size: u64,
        at: DateTime<Utc>,
    ) {
        let previous = self.synced_files.insert(
            remote_path.as_str().to_string(),
            SyncedFile {
                local_path: local_path.display().to_string(),
                synced_at: at,
                size,
            },
        );

        if let Some(previous) = previous {
            self.total_size = self.total_size.saturating_sub(previous.size);
        }
        self.total_size += size;
        self.total_synced = self.synced_files.len() as u64;

        self.clear_failure(remote_path);
    }

    /// Records a failed transfer and returns the new consecutive failure count
    pub fn mark_failed(
        &mut self,
        remote_path: &RemotePath,
        filename: &str,
        at: DateTime<Utc>,
    ) -> u32 {
        let retry_count = self.retry_count(remote_path) + 1;
        self.failed_downloads.insert(
            remote_path.as_str().to_string(),
            FailedDownload {
                filename: filename.to_string(),
                failed_at: at,
                retry_count,
            },
        );
        retry_count
    }

    /// Removes the failure record of `remote_path`, returning whether one existed
    pub fn clear_failure(&mut self, remote_path: &RemotePath) -> bool {
        self.failed_downloads.remove(remote_path.as_str()).is_some()
    }

    /// Consecutive failure count of `remote_path` (0 when it never failed)
    pub fn retry_count(&self, remote_path: &RemotePath) -> u32 {
        self.failed_downloads
            .get(remote_path.as_str())
            .map_or(0, |failed| failed.retry_count)
    }

    /// Returns true once the file failed `max_retries` times in a row
    pub fn is_retry_exhausted(&self, remote_path: &RemotePath, max_retries: u32) -> bool {
        self.retry_count(remote_path) >= max_retries
    }

    /// Stamps the completion time of a pass
    pub fn record_pass(&mut self, at: DateTime<Utc>) {
        self.last_sync = Some(at);
    }

    /// Number of files currently in the failure ledger
    pub fn failed_count(&self) -> usize {
        self.failed_downloads.len()
    }

    /// Recomputes the totals from `synced_files`
    ///
    /// Ledgers written by older versions may carry drifted counters. Also
    /// drops failure entries for files that are already synced. Returns true
    /// if anything changed.
    pub fn reconcile_totals(&mut self) -> bool {
        let total_synced = self.synced_files.len() as u64;
        let total_size = self.synced_files.values().map(|f| f.size).sum();

        let before = self.failed_downloads.len();
        let synced = &self.synced_files;
        self.failed_downloads.retain(|path, _| !synced.contains_key(path));

        let changed = total_synced != self.total_synced
            || total_size != self.total_size
            || before != self.failed_downloads.len();

        self.total_synced = total_synced;
        self.total_size = total_size;
        changed
    }
}
