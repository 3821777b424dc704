//! Incremental sync engine
//!
//! The [`SyncEngine`] mirrors one owner's remote catalog into one local
//! root. One instance exists per (owner, local root) pair and is shared by
//! reference (`Arc<SyncEngine>`) with every caller.
//!
//! ## Sync Pass
//!
//! 1. **List**: fetch the owner's catalog; a failure ends the pass as `error`
//!    without touching the ledger
//! 2. **Plan**: diff against the ledger, short-circuiting complete local files
//! 3. **Transfer**: run the plan under the concurrency cap, recording every
//!    outcome as it completes
//! 4. **Bookkeeping**: stamp `last_sync`, persist the ledger once, emit
//!    `sync_completed`
//!
//! ## Concurrency
//!
//! Passes (and retry passes) are serialized by an async pass lock. The
//! in-memory ledger lives behind a `std::sync::Mutex` that is only taken
//! for non-suspending updates, never across an `.await`.
//!
//! ## Notifications
//!
//! Events are delivered on spawned tasks bounded by `notify_timeout`, so a
//! slow consumer never stalls transfers. Delivery errors are logged and
//! dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use cloudmirror_core::config::Config;
use cloudmirror_core::domain::{OwnerId, SyncEvent, SyncState, TransferTask};
use cloudmirror_core::ports::{IEventNotifier, IRemoteCatalog, ISyncStateStore};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::scheduler::{TransferOutcome, TransferScheduler};
use crate::SyncError;

// ============================================================================
// Settings
// ============================================================================

/// Tunables of a [`SyncEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Maximum transfers in flight
    pub max_concurrent: usize,
    /// Consecutive failures after which a file is no longer retried
    pub max_retries: u32,
    /// Time between passes in periodic mode
    pub interval: Duration,
    /// Wait after a failed pass in periodic mode (capped at `interval`)
    pub error_cooldown: Duration,
    /// Whether passes run at all
    pub enabled: bool,
    /// Upper bound for one notification delivery
    pub notify_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            max_retries: 3,
            interval: Duration::from_secs(300),
            error_cooldown: Duration::from_secs(60),
            enabled: true,
            notify_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.sync.max_concurrent,
            max_retries: config.sync.max_retries,
            interval: Duration::from_secs(config.sync.interval_secs),
            error_cooldown: Duration::from_secs(config.sync.error_cooldown_secs),
            enabled: config.sync.enabled,
            notify_timeout: Duration::from_secs(config.notifier.timeout_secs),
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Totals of a pass that transferred at least one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result of [`SyncEngine::run_once`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed(PassSummary),
    NoNewFiles,
    Disabled,
    Error { error: String },
}

impl PassOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            PassOutcome::Completed(_) => "completed",
            PassOutcome::NoNewFiles => "no_new_files",
            PassOutcome::Disabled => "disabled",
            PassOutcome::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PassOutcome::Error { .. })
    }
}

/// Totals of a retry pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrySummary {
    pub total_retries: usize,
    pub successful: usize,
    pub failed: usize,
    /// Entries left alone because they reached the retry cap
    pub skipped: usize,
}

/// Result of [`SyncEngine::retry_failed`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetryOutcome {
    Completed(RetrySummary),
    NoFailedDownloads,
    Error { error: String },
}

impl RetryOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RetryOutcome::Completed(_) => "completed",
            RetryOutcome::NoFailedDownloads => "no_failed_downloads",
            RetryOutcome::Error { .. } => "error",
        }
    }
}

/// Snapshot returned by [`SyncEngine::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub owner_id: String,
    pub local_root: PathBuf,
    pub enabled: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub total_synced: u64,
    pub total_size: u64,
    pub failed_downloads: usize,
    pub interval_secs: u64,
    pub backend: &'static str,
    pub state_file: PathBuf,
}

#[derive(Debug, Default)]
struct Tally {
    successful: usize,
    failed: usize,
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Mirrors one owner's catalog into one local root
pub struct SyncEngine {
    owner: OwnerId,
    local_root: PathBuf,
    catalog: Arc<dyn IRemoteCatalog>,
    store: Arc<dyn ISyncStateStore>,
    notifier: Arc<dyn IEventNotifier>,
    scheduler: TransferScheduler,
    settings: SyncSettings,
    state: Mutex<SyncState>,
    pass_lock: tokio::sync::Mutex<()>,
    enabled: AtomicBool,
    interval_ms: AtomicU64,
}

impl SyncEngine {
    /// Creates the engine, the local root if needed, and loads the ledger
    ///
    /// # Errors
    /// Returns [`SyncError::LocalRoot`] if the root directory cannot be created
    pub fn initialize(
        owner: OwnerId,
        local_root: impl Into<PathBuf>,
        catalog: Arc<dyn IRemoteCatalog>,
        store: Arc<dyn ISyncStateStore>,
        notifier: Arc<dyn IEventNotifier>,
        settings: SyncSettings,
    ) -> Result<Self, SyncError> {
        let local_root = local_root.into();
        std::fs::create_dir_all(&local_root).map_err(|source| SyncError::LocalRoot {
            path: local_root.clone(),
            source,
        })?;

        let state = store.load();
        info!(
            owner = %owner,
            local_root = %local_root.display(),
            backend = catalog.backend_name(),
            synced = state.total_synced,
            failed = state.failed_count(),
            "sync engine initialized"
        );

        let scheduler =
            TransferScheduler::new(catalog.clone(), local_root.clone(), settings.max_retries);

        Ok(Self {
            owner,
            local_root,
            catalog,
            store,
            notifier,
            scheduler,
            enabled: AtomicBool::new(settings.enabled),
            interval_ms: AtomicU64::new(duration_ms(settings.interval)),
            settings,
            state: Mutex::new(state),
            pass_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Copy of the in-memory ledger
    pub fn state(&self) -> SyncState {
        self.with_state(|state| state.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    // ========================================================================
    // Enable / disable / interval
    // ========================================================================

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
        info!("sync enabled");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        info!("sync disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Changes the periodic interval; takes effect after the current wait
    pub fn set_interval(&self, interval: Duration) {
        let ms = duration_ms(interval);
        self.interval_ms.store(ms, Ordering::Release);
        info!(interval_ms = ms, "sync interval updated");
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Acquire))
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn status(&self) -> SyncStatus {
        let (last_sync, total_synced, total_size, failed_downloads) = self.with_state(|s| {
            (s.last_sync, s.total_synced, s.total_size, s.failed_count())
        });

        SyncStatus {
            owner_id: self.owner.to_string(),
            local_root: self.local_root.clone(),
            enabled: self.is_enabled(),
            last_sync,
            total_synced,
            total_size,
            failed_downloads,
            interval_secs: self.interval().as_secs(),
            backend: self.catalog.backend_name(),
            state_file: self.store.location().to_path_buf(),
        }
    }

    // ========================================================================
    // Sync pass
    // ========================================================================

    /// Runs one sync pass
    ///
    /// Never fails: catalog errors are reported as [`PassOutcome::Error`],
    /// persistence and notification errors are logged.
    #[tracing::instrument(skip(self), fields(owner = %self.owner))]
    pub async fn run_once(&self) -> PassOutcome {
        if !self.is_enabled() {
            info!("sync is disabled, skipping pass");
            return PassOutcome::Disabled;
        }

        let _pass = self.pass_lock.lock().await;
        let started = Instant::now();
        info!("starting sync pass");

        let files = match self.catalog.list(&self.owner).await {
            Ok(files) => files,
            Err(e) => {
                let err = SyncError::CatalogUnavailable(e);
                error!(error = %err, "sync pass aborted");
                return PassOutcome::Error {
                    error: err.to_string(),
                };
            }
        };
        let listed = files.len();

        let plan = self.with_state(|state| self.scheduler.plan(files, state));

        if plan.tasks.is_empty() {
            if plan.touched_state() {
                self.with_state(|state| state.record_pass(Utc::now()));
                self.persist();
            }
            info!(
                listed,
                reconciled = plan.reconciled,
                exhausted = plan.exhausted,
                "no new files to sync"
            );
            return PassOutcome::NoNewFiles;
        }

        let total_files = plan.tasks.len();
        let tally = self.execute(plan.tasks).await;

        let timestamp = Utc::now();
        self.with_state(|state| state.record_pass(timestamp));
        self.persist();

        let summary = PassSummary {
            total_files,
            successful: tally.successful,
            failed: tally.failed,
            duration_secs: started.elapsed().as_secs_f64(),
            timestamp,
        };

        info!(
            total = summary.total_files,
            successful = summary.successful,
            failed = summary.failed,
            reconciled = plan.reconciled,
            duration_ms = started.elapsed().as_millis() as u64,
            "sync pass completed"
        );

        self.notify(SyncEvent::SyncCompleted {
            owner_id: self.owner.to_string(),
            total_files: summary.total_files,
            successful: summary.successful,
            failed: summary.failed,
            duration_secs: summary.duration_secs,
            timestamp,
        })
        .await;

        PassOutcome::Completed(summary)
    }

    // ========================================================================
    // Retry pass
    // ========================================================================

    /// Re-attempts every failed transfer that is still below the retry cap
    ///
    /// Entries at the cap, and entries the catalog no longer lists, stay in
    /// the failure ledger unchanged.
    #[tracing::instrument(skip(self), fields(owner = %self.owner))]
    pub async fn retry_failed(&self) -> RetryOutcome {
        let _pass = self.pass_lock.lock().await;

        let pending = self.with_state(|state| state.failed_count());
        if pending == 0 {
            debug!("no failed downloads to retry");
            return RetryOutcome::NoFailedDownloads;
        }
        info!(pending, "retrying failed downloads");

        let files = match self.catalog.list(&self.owner).await {
            Ok(files) => files,
            Err(e) => {
                let err = SyncError::CatalogUnavailable(e);
                error!(error = %err, "retry aborted");
                return RetryOutcome::Error {
                    error: err.to_string(),
                };
            }
        };

        let plan = self.with_state(|state| self.scheduler.plan_retry(files, state));
        let attempted = plan.tasks.len();
        let tally = self.execute(plan.tasks).await;

        if attempted > 0 || plan.reconciled > 0 {
            self.persist();
        }

        let summary = RetrySummary {
            total_retries: attempted + plan.reconciled,
            successful: tally.successful + plan.reconciled,
            failed: tally.failed,
            skipped: plan.exhausted.len(),
        };
        info!(
            total = summary.total_retries,
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            missing = plan.missing.len(),
            "retry pass completed"
        );

        RetryOutcome::Completed(summary)
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Runs `tasks` and records every outcome in the ledger as it completes
    async fn execute(&self, tasks: Vec<TransferTask>) -> Tally {
        let mut tally = Tally::default();
        let mut deliveries = JoinSet::new();

        self.scheduler
            .run_with(tasks, self.settings.max_concurrent, |outcome| {
                if let Some(event) = self.record_outcome(outcome, &mut tally) {
                    let notifier = self.notifier.clone();
                    let timeout = self.settings.notify_timeout;
                    deliveries.spawn(async move { deliver(notifier.as_ref(), &event, timeout).await });
                }
            })
            .await;

        while deliveries.join_next().await.is_some() {}
        tally
    }

    /// Applies one transfer outcome to the ledger
    ///
    /// Returns the `file_synced` event to emit on success.
    fn record_outcome(&self, outcome: TransferOutcome, tally: &mut Tally) -> Option<SyncEvent> {
        let TransferOutcome { task, result } = outcome;
        let remote_path = task.remote_path();
        let now = Utc::now();

        match result {
            Ok(size) => {
                self.with_state(|state| state.mark_synced(remote_path, &task.destination, size, now));
                tally.successful += 1;
                info!(remote_path = %remote_path, size, "file synced");

                Some(SyncEvent::FileSynced {
                    owner_id: self.owner.to_string(),
                    filename: task.record.filename.clone(),
                    collection_name: task.record.collection_name.clone(),
                    remote_path: remote_path.to_string(),
                    local_path: task.destination.display().to_string(),
                    size,
                    synced_at: now,
                })
            }
            Err(e) => {
                let retry_count = self.with_state(|state| {
                    state.mark_failed(remote_path, &task.record.filename, now)
                });
                tally.failed += 1;

                if retry_count >= self.settings.max_retries {
                    warn!(
                        remote_path = %remote_path,
                        retry_count,
                        error = %e,
                        "file failed too many times, excluded from automatic retry"
                    );
                } else {
                    warn!(remote_path = %remote_path, retry_count, error = %e, "file sync failed");
                }
                None
            }
        }
    }

    /// Writes the ledger; failures are logged and the in-memory state kept
    fn persist(&self) {
        let result = self.with_state(|state| self.store.save(state));
        if let Err(e) = result {
            let err = SyncError::StatePersist(e);
            error!(error = %err, path = %self.store.location().display(), "state not persisted");
        }
    }

    async fn notify(&self, event: SyncEvent) {
        deliver(self.notifier.as_ref(), &event, self.settings.notify_timeout).await;
    }
}

/// Interval in milliseconds, never zero
fn duration_ms(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Delivers `event` best-effort within `timeout`
async fn deliver(notifier: &dyn IEventNotifier, event: &SyncEvent, timeout: Duration) {
    match tokio::time::timeout(timeout, notifier.push(event)).await {
        Ok(Ok(())) => debug!(event_type = event.event_type(), "event delivered"),
        Ok(Err(e)) => warn!(event_type = event.event_type(), error = %format!("{e:#}"), "event delivery failed"),
        Err(_) => warn!(
            event_type = event.event_type(),
            timeout_ms = timeout.as_millis() as u64,
            "event delivery timed out"
        ),
    }
}
