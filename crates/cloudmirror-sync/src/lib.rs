//! cloudmirror Sync - Incremental mirror engine
//!
//! Provides:
//! - Diffing of the remote catalog against the durable sync ledger
//! - Bounded-concurrency transfers with size verification
//! - Bounded retry bookkeeping for failed transfers
//! - A perpetual periodic mode that survives failing passes
//!
//! ## Modules
//!
//! - [`scheduler`] - Transfer planning and bounded-concurrency execution
//! - [`engine`] - One sync pass, retry pass, status and enable/disable
//! - [`periodic`] - Timer loop driving the engine until cancelled

pub mod engine;
pub mod periodic;
pub mod scheduler;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::{
    PassOutcome, PassSummary, RetryOutcome, RetrySummary, SyncEngine, SyncSettings, SyncStatus,
};
pub use periodic::run_periodic;
pub use scheduler::{TransferOutcome, TransferPlan, TransferScheduler};

/// Errors that can occur while setting up or running a sync pass
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote catalog could not be listed; the pass is abandoned
    #[error("Catalog unavailable: {0:#}")]
    CatalogUnavailable(#[source] anyhow::Error),

    /// The local mirror root could not be created
    #[error("Cannot prepare local root {path}: {source}")]
    LocalRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sync ledger could not be written
    #[error("Failed to persist sync state: {0:#}")]
    StatePersist(#[source] anyhow::Error),
}

/// Errors that can occur while transferring a single file
#[derive(Debug, Error)]
pub enum TransferError {
    /// The catalog failed to deliver the object
    #[error("Download failed: {0:#}")]
    Download(#[source] anyhow::Error),

    /// A local file or directory operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transferred file does not have the size the catalog recorded
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}
