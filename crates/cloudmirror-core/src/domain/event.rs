//! Outbound sync events
//!
//! Events are serialized as `{"type": <event-name>, "data": {...}}`, which is
//! the body the HTTP notifier posts and what in-process subscribers receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event emitted by the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SyncEvent {
    /// One file was mirrored to the local root
    FileSynced {
        owner_id: String,
        filename: String,
        collection_name: String,
        remote_path: String,
        local_path: String,
        size: u64,
        synced_at: DateTime<Utc>,
    },
    /// A sync pass finished transferring its plan
    SyncCompleted {
        owner_id: String,
        total_files: usize,
        successful: usize,
        failed: usize,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },
}

impl SyncEvent {
    /// Wire name of the event
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::FileSynced { .. } => "file_synced",
            SyncEvent::SyncCompleted { .. } => "sync_completed",
        }
    }
}
