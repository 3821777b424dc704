//! Integration tests for cloudmirror-sync
//!
//! Drives the SyncEngine against an instrumented in-memory catalog and the
//! real JSON state store, covering incremental passes, the local size
//! recheck, the concurrency bound, retry bookkeeping, crash safety and the
//! periodic loop.

mod common;

mod test_concurrency;
mod test_crash_safety;
