//! Shared helpers for notifier integration tests

use chrono::{TimeZone, Utc};
use cloudmirror_core::domain::SyncEvent;
use wiremock::MockServer;

use cloudmirror_notify::HttpEventNotifier;

pub const ENDPOINT: &str = "/api/sync/notification";

/// Starts a mock consumer and returns a notifier pointed at it
pub async fn setup_consumer() -> (MockServer, HttpEventNotifier) {
    let server = MockServer::start().await;
    let notifier = HttpEventNotifier::new(&server.uri(), ENDPOINT).expect("valid mock url");
    (server, notifier)
}

pub fn file_synced_event() -> SyncEvent {
    SyncEvent::FileSynced {
        owner_id: "u1".into(),
        filename: "clip.mp4".into(),
        collection_name: "news".into(),
        remote_path: "u1/news/clip.mp4".into(),
        local_path: "/mirror/news/clip.mp4".into(),
        size: 2048,
        synced_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
    }
}
