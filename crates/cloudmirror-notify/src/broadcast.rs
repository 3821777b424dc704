//! In-process event fan-out
//!
//! A presentation layer (tray icon, TUI, dashboard bridge) subscribes to a
//! [`BroadcastNotifier`] instead of polling the engine.

use async_trait::async_trait;
use cloudmirror_core::domain::SyncEvent;
use cloudmirror_core::ports::IEventNotifier;
use tokio::sync::broadcast;

/// Default channel capacity; slow subscribers lag past this many events
const DEFAULT_CAPACITY: usize = 256;

/// Notifier that re-publishes events on a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<SyncEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for all events pushed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IEventNotifier for BroadcastNotifier {
    async fn push(&self, event: &SyncEvent) -> anyhow::Result<()> {
        // send only fails when nobody is listening
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(event_type = event.event_type(), "no subscribers");
        }
        Ok(())
    }
}
