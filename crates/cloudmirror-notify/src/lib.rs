//! cloudmirror Notify - Outbound sync events
//!
//! Adapters implementing the `IEventNotifier` port from `cloudmirror-core`:
//!
//! - [`HttpEventNotifier`] - POSTs `{"type", "data"}` JSON to an external consumer
//! - [`BroadcastNotifier`] - In-process fan-out for a presentation layer
//! - [`NoopNotifier`] - Drops every event, used when no consumer is configured
//!
//! Delivery is best-effort everywhere. The sync engine logs failures from
//! these adapters and moves on.

pub mod broadcast;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use cloudmirror_core::config::NotifierConfig;
use cloudmirror_core::domain::SyncEvent;
use cloudmirror_core::ports::IEventNotifier;

pub use broadcast::BroadcastNotifier;
pub use http::HttpEventNotifier;

/// Errors that can occur while delivering an event
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The request never produced a response (connect error, timeout)
    #[error("Delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The consumer answered with a non-2xx status
    #[error("Consumer rejected event with status {status}")]
    Rejected { status: u16 },

    /// The notifier URL could not be built
    #[error("Invalid notifier URL: {0}")]
    InvalidUrl(String),
}

/// Notifier that silently discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl IEventNotifier for NoopNotifier {
    async fn push(&self, event: &SyncEvent) -> anyhow::Result<()> {
        tracing::trace!(event_type = event.event_type(), "notifications disabled, dropping event");
        Ok(())
    }
}

/// Builds the notifier described by `config`
///
/// Returns a [`NoopNotifier`] when no URL is configured.
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn IEventNotifier>, NotifyError> {
    match &config.url {
        Some(url) => Ok(Arc::new(HttpEventNotifier::from_config(url, config)?)),
        None => Ok(Arc::new(NoopNotifier)),
    }
}
