//! Concurrency limits and overlapping passes

use std::sync::Arc;
use std::time::Duration;

use cloudmirror_sync::PassOutcome;
use tempfile::TempDir;

use crate::common::{self, MemoryCatalog, RecordingNotifier};

#[tokio::test]
async fn test_transfers_respect_concurrency_limit() {
    let dir = TempDir::new().unwrap();
    let catalog = MemoryCatalog::with_delay(Duration::from_millis(50));
    for i in 0..8 {
        catalog.add_file("news", &format!("clip-{i}.mp4"), b"payload");
    }

    let engine = common::engine(dir.path(), catalog.clone(), RecordingNotifier::new(), common::settings(3));
    let outcome = engine.run_once().await;

    assert!(matches!(outcome, PassOutcome::Completed(ref s) if s.successful == 8));
    assert_eq!(catalog.get_count(), 8);
    assert!(catalog.max_in_flight() <= 3, "max in flight {}", catalog.max_in_flight());
    assert!(catalog.max_in_flight() > 1, "transfers never overlapped");
}

#[tokio::test]
async fn test_limit_of_one_is_sequential() {
    let dir = TempDir::new().unwrap();
    let catalog = MemoryCatalog::with_delay(Duration::from_millis(10));
    for i in 0..4 {
        catalog.add_file("docs", &format!("doc-{i}.pdf"), b"pdf");
    }

    let engine = common::engine(dir.path(), catalog.clone(), RecordingNotifier::new(), common::settings(1));
    engine.run_once().await;

    assert_eq!(catalog.max_in_flight(), 1);
    assert_eq!(engine.state().total_synced, 4);
}

#[tokio::test]
async fn test_overlapping_passes_never_download_twice() {
    let dir = TempDir::new().unwrap();
    let catalog = MemoryCatalog::with_delay(Duration::from_millis(50));
    for i in 0..4 {
        catalog.add_file("news", &format!("clip-{i}.mp4"), b"payload");
    }

    let engine = Arc::new(common::engine(
        dir.path(),
        catalog.clone(),
        RecordingNotifier::new(),
        common::settings(2),
    ));

    let (first, second) = tokio::join!(engine.run_once(), engine.run_once());

    let completed = [&first, &second]
        .iter()
        .filter(|o| matches!(o, PassOutcome::Completed(_)))
        .count();
    assert_eq!(completed, 1);
    assert!([&first, &second].contains(&&PassOutcome::NoNewFiles));
    assert_eq!(catalog.get_count(), 4);
}
