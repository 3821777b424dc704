//! Domain entities and bookkeeping logic
//!
//! This module contains the core domain types for cloudmirror:
//! - Newtypes for validated identifiers (`OwnerId`, `RemotePath`)
//! - File records produced by the upload side of the catalog
//! - The durable sync ledger (`SyncState`)
//! - Transfer tasks and outbound events
//! - Lenient timestamp parsing for ledgers written by other tools
//! - Domain-specific error types

pub mod errors;
pub mod event;
pub mod file_record;
pub mod newtypes;
pub mod sync_state;
pub mod timestamp;

// Re-export commonly used types
pub use errors::DomainError;
pub use event::SyncEvent;
pub use file_record::{FileRecord, TransferTask, UploadRequest};
pub use newtypes::{OwnerId, RemotePath};
pub use sync_state::{FailedDownload, SyncState, SyncedFile};
