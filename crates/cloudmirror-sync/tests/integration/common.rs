//! Shared test doubles for sync engine integration tests

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cloudmirror_core::domain::{FileRecord, OwnerId, RemotePath, SyncEvent, SyncState, UploadRequest};
use cloudmirror_core::ports::{IEventNotifier, IRemoteCatalog, ISyncStateStore};
use cloudmirror_state::JsonStateStore;
use cloudmirror_sync::{SyncEngine, SyncSettings};

pub const OWNER: &str = "u1";
pub const STATE_FILE: &str = ".sync_state.json";

pub fn owner() -> OwnerId {
    OwnerId::new(OWNER).unwrap()
}

// ============================================================================
// MemoryCatalog
// ============================================================================

/// In-memory catalog that records how it is used
///
/// - `delay` is applied to every `get` so transfers overlap
/// - `in_flight` / `max_in_flight` track concurrent `get` calls
/// - individual objects, the listing, or the listing with a panic can be
///   made to fail
#[derive(Default)]
pub struct MemoryCatalog {
    records: Mutex<Vec<FileRecord>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    gets: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    list_calls: AtomicUsize,
    list_failures_left: AtomicUsize,
    panic_on_list: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        let catalog = Self::default();
        *catalog.delay.lock().unwrap() = delay;
        Arc::new(catalog)
    }

    /// Publishes a file in `collection` and returns its record
    pub fn add_file(&self, collection: &str, filename: &str, content: &[u8]) -> FileRecord {
        let request = UploadRequest::new(owner(), collection, filename);
        let remote = request.remote_path().unwrap();
        let record = request.into_record(
            remote.clone(),
            content.len() as u64,
            Path::new("/upload"),
            Utc::now(),
        );
        self.contents
            .lock()
            .unwrap()
            .insert(remote.to_string(), content.to_vec());
        self.records.lock().unwrap().push(record.clone());
        record
    }

    /// Makes every `get` of `remote_path` fail
    pub fn fail_get(&self, remote_path: &RemotePath) {
        self.failing.lock().unwrap().insert(remote_path.to_string());
    }

    /// Makes `get` of `remote_path` work again
    pub fn heal(&self, remote_path: &RemotePath) {
        self.failing.lock().unwrap().remove(remote_path.as_str());
    }

    /// Makes `get` of `remote_path` write half the object and then hang
    pub fn stall_get(&self, remote_path: &RemotePath) {
        self.stalled.lock().unwrap().insert(remote_path.to_string());
    }

    /// Makes the next `n` listings fail
    pub fn fail_next_lists(&self, n: usize) {
        self.list_failures_left.store(n, Ordering::SeqCst);
    }

    /// Makes the next listing panic
    pub fn panic_on_next_list(&self) {
        self.panic_on_list.store(true, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IRemoteCatalog for MemoryCatalog {
    async fn list(&self, owner: &OwnerId) -> anyhow::Result<Vec<FileRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_list.swap(false, Ordering::SeqCst) {
            panic!("simulated listing panic");
        }
        let failures = self.list_failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            self.list_failures_left.store(failures - 1, Ordering::SeqCst);
            anyhow::bail!("catalog unreachable");
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn get(&self, remote_path: &RemotePath, local_dest: &Path) -> anyhow::Result<()> {
        self.gets.lock().unwrap().push(remote_path.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        tokio::time::sleep(delay).await;

        let result = self.serve(remote_path, local_dest).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn put(&self, local_src: &Path, request: &UploadRequest) -> anyhow::Result<RemotePath> {
        let content = std::fs::read(local_src)?;
        let record = self.add_file(&request.collection_name, &request.filename, &content);
        Ok(record.remote_path)
    }

    async fn delete(&self, remote_path: &RemotePath) -> anyhow::Result<bool> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| &r.remote_path != remote_path);
        Ok(records.len() != before)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl MemoryCatalog {
    async fn serve(&self, remote_path: &RemotePath, local_dest: &Path) -> anyhow::Result<()> {
        let failing = self.failing.lock().unwrap().contains(remote_path.as_str());
        if failing {
            anyhow::bail!("simulated transfer failure");
        }
        let content = self
            .contents
            .lock()
            .unwrap()
            .get(remote_path.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such object"))?;

        let stalled = self.stalled.lock().unwrap().contains(remote_path.as_str());
        if stalled {
            std::fs::write(local_dest, &content[..content.len() / 2])?;
            std::future::pending::<()>().await;
        }

        std::fs::write(local_dest, content)?;
        Ok(())
    }
}

// ============================================================================
// Notifiers and stores
// ============================================================================

/// Notifier that remembers every event
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

#[async_trait]
impl IEventNotifier for RecordingNotifier {
    async fn push(&self, event: &SyncEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Notifier that either errors or never answers
pub struct BrokenNotifier {
    pub hang: bool,
}

#[async_trait]
impl IEventNotifier for BrokenNotifier {
    async fn push(&self, _event: &SyncEvent) -> anyhow::Result<()> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        anyhow::bail!("consumer rejected event with status 500")
    }
}

/// State store whose writes always fail
pub struct ReadOnlyStore {
    pub location: std::path::PathBuf,
}

impl ISyncStateStore for ReadOnlyStore {
    fn load(&self) -> SyncState {
        SyncState::new()
    }

    fn save(&self, _state: &SyncState) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

// ============================================================================
// Engine construction
// ============================================================================

pub fn settings(max_concurrent: usize) -> SyncSettings {
    SyncSettings {
        max_concurrent,
        notify_timeout: Duration::from_millis(200),
        ..SyncSettings::default()
    }
}

pub fn store(root: &Path) -> Arc<JsonStateStore> {
    Arc::new(JsonStateStore::for_root(root, STATE_FILE))
}

/// Engine over `root` with the JSON store and a recording notifier
pub fn engine(
    root: &Path,
    catalog: Arc<MemoryCatalog>,
    notifier: Arc<RecordingNotifier>,
    settings: SyncSettings,
) -> SyncEngine {
    SyncEngine::initialize(owner(), root, catalog, store(root), notifier, settings)
        .expect("engine initializes")
}

/// Reads the persisted ledger straight from disk
pub fn persisted_state(root: &Path) -> SyncState {
    let content = std::fs::read_to_string(root.join(STATE_FILE)).expect("state file exists");
    serde_json::from_str(&content).expect("state file is valid JSON")
}

/// Creates `root/collection/filename` with `content`
pub fn write_local(root: &Path, collection: &str, filename: &str, content: &[u8]) {
    let dir = root.join(collection);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(filename), content).unwrap();
}
