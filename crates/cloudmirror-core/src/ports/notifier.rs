//! Event notifier port (driven/secondary port)
//!
//! Delivers [`SyncEvent`]s to an external consumer such as a web dashboard
//! or an in-process UI.
//!
//! ## Design Notes
//!
//! - Delivery is best-effort: the engine logs and discards any error
//!   returned here, never retries, and never surfaces it to its caller.
//! - Implementations should bound their own latency; the engine also wraps
//!   every call in a timeout.

use crate::domain::SyncEvent;

/// Port trait for outbound event delivery
#[async_trait::async_trait]
pub trait IEventNotifier: Send + Sync {
    /// Delivers one event
    async fn push(&self, event: &SyncEvent) -> anyhow::Result<()>;
}
