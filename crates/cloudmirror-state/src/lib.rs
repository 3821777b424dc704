//! cloudmirror State - Durable sync ledger
//!
//! JSON-file persistence for the [`SyncState`](cloudmirror_core::domain::SyncState)
//! ledger of one (owner, local root) pair.
//!
//! ## Architecture
//!
//! This crate implements the `ISyncStateStore` port from `cloudmirror-core`.
//! It is a driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`JsonStateStore`] - Atomic write-temp-then-rename JSON store
//! - [`StateError`] - Error types for ledger persistence
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use cloudmirror_core::ports::ISyncStateStore;
//! use cloudmirror_state::JsonStateStore;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = JsonStateStore::for_root(Path::new("/home/user/Downloads/cloudmirror"), ".sync_state.json");
//! let mut state = store.load();
//! state.record_pass(chrono::Utc::now());
//! store.save(&state)?;
//! # Ok(())
//! # }
//! ```

pub mod json_store;

pub use json_store::JsonStateStore;

/// Errors that can occur while persisting the sync ledger
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The ledger could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing, syncing or renaming the ledger file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
