//! Interrupted passes leave a ledger the next run can trust

use std::time::Duration;

use cloudmirror_sync::PassOutcome;
use tempfile::TempDir;

use crate::common::{self, MemoryCatalog, RecordingNotifier};

#[tokio::test]
async fn test_abandoned_pass_keeps_previous_ledger() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let catalog = MemoryCatalog::new();
    catalog.add_file("news", "a.mp4", b"aaaa");
    catalog.add_file("news", "b.mp4", b"bbbb");
    {
        let engine = common::engine(root, catalog.clone(), RecordingNotifier::new(), common::settings(2));
        engine.run_once().await;
    }
    let before = common::persisted_state(root);
    assert_eq!(before.total_synced, 2);

    // a new file hangs halfway through; the pass is dropped mid-transfer
    let stalled = catalog.add_file("news", "c.mp4", b"cccccccc");
    catalog.stall_get(&stalled.remote_path);
    {
        let engine = common::engine(root, catalog.clone(), RecordingNotifier::new(), common::settings(2));
        let result = tokio::time::timeout(Duration::from_millis(200), engine.run_once()).await;
        assert!(result.is_err(), "pass should still be stuck");
    }

    // simulate a write torn by the crash
    std::fs::write(root.join(format!("{}.tmp", common::STATE_FILE)), b"{\"synced_fi").unwrap();

    assert_eq!(common::persisted_state(root), before);
    let partial = std::fs::metadata(root.join("news/c.mp4")).unwrap().len();
    assert_eq!(partial, 4);

    // a restarted engine sees the old ledger and replaces the partial file
    let fresh = MemoryCatalog::new();
    fresh.add_file("news", "a.mp4", b"aaaa");
    fresh.add_file("news", "b.mp4", b"bbbb");
    fresh.add_file("news", "c.mp4", b"cccccccc");

    let engine = common::engine(root, fresh.clone(), RecordingNotifier::new(), common::settings(2));
    assert_eq!(engine.state().total_synced, 2);

    let outcome = engine.run_once().await;
    assert!(matches!(outcome, PassOutcome::Completed(ref s) if s.total_files == 1 && s.successful == 1));
    assert_eq!(fresh.gets(), vec!["u1/news/c.mp4".to_string()]);
    assert_eq!(std::fs::read(root.join("news/c.mp4")).unwrap(), b"cccccccc");
    assert_eq!(common::persisted_state(root).total_synced, 3);
}

#[tokio::test]
async fn test_corrupt_ledger_starts_fresh_and_reconciles() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    common::write_local(root, "news", "a.mp4", b"aaaa");
    std::fs::write(root.join(common::STATE_FILE), b"not json").unwrap();

    let catalog = MemoryCatalog::new();
    catalog.add_file("news", "a.mp4", b"aaaa");

    let engine = common::engine(root, catalog.clone(), RecordingNotifier::new(), common::settings(2));
    assert_eq!(engine.state().total_synced, 0);

    // the local copy is recognised, so nothing is fetched
    assert_eq!(engine.run_once().await, PassOutcome::NoNewFiles);
    assert_eq!(catalog.get_count(), 0);
    assert_eq!(common::persisted_state(root).total_synced, 1);
}
