//! Sync state store port (driven/secondary port)
//!
//! Persists the [`SyncState`] ledger for one (owner, local root) pair.
//!
//! ## Design Notes
//!
//! - The trait is synchronous: writing the ledger never suspends the
//!   controlling task, so no other transfer outcome can interleave with a save.
//! - `load` is infallible. A missing, unreadable or corrupt ledger yields a
//!   fresh empty state; the next pass simply recomputes the diff.
//! - `save` must never leave a torn file visible to a later `load`.
//! - Exactly one engine instance writes a given store; there is no
//!   cross-process locking.

use std::path::Path;

use crate::domain::SyncState;

/// Port trait for durable sync ledger storage
pub trait ISyncStateStore: Send + Sync {
    /// Returns the persisted ledger, or an empty one if none can be read
    fn load(&self) -> SyncState;

    /// Atomically replaces the persisted ledger with `state`
    fn save(&self, state: &SyncState) -> anyhow::Result<()>;

    /// Where the ledger lives, for status output
    fn location(&self) -> &Path;
}
