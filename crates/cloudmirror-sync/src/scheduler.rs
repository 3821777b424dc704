//! Transfer scheduler - diff computation and bounded-concurrency transfers
//!
//! The [`TransferScheduler`] turns a catalog listing into a list of
//! [`TransferTask`]s and executes them against the remote catalog.
//!
//! ## Planning
//!
//! A record is planned for transfer unless
//! - its remote path is already in `synced_files`,
//! - a local file of exactly the recorded size already sits at its
//!   destination (the record is marked synced on the spot, no `get`), or
//! - its failure count reached `max_retries`.
//!
//! ## Execution
//!
//! ```text
//! tasks ──→ buffer_unordered(limit) ──→ outcomes (completion order)
//! ```
//!
//! At most `limit` transfers are in flight. Outcomes are handed to the
//! caller one at a time, in completion order, so the caller can record
//! each result without ever suspending in between.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cloudmirror_core::domain::{FileRecord, RemotePath, SyncState, TransferTask};
use cloudmirror_core::ports::IRemoteCatalog;
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::TransferError;

// ============================================================================
// Plans and outcomes
// ============================================================================

/// Result of diffing a catalog listing against the sync ledger
#[derive(Debug, Default)]
pub struct TransferPlan {
    /// Files that need an actual transfer
    pub tasks: Vec<TransferTask>,
    /// Files marked synced by the local size recheck
    pub reconciled: usize,
    /// Files skipped because their failure count reached the cap
    pub exhausted: usize,
    /// Records rejected by validation
    pub invalid: usize,
}

impl TransferPlan {
    /// True when the plan changed the ledger without transferring anything
    pub fn touched_state(&self) -> bool {
        self.reconciled > 0
    }
}

/// Result of re-resolving the failure ledger against the catalog
#[derive(Debug, Default)]
pub struct RetryPlan {
    /// Failed files to attempt again
    pub tasks: Vec<TransferTask>,
    /// Failed files whose local copy turned out complete
    pub reconciled: usize,
    /// Failed files left alone because they reached the retry cap
    pub exhausted: Vec<RemotePath>,
    /// Failed files the catalog no longer lists
    pub missing: Vec<String>,
}

/// Outcome of one transfer
#[derive(Debug)]
pub struct TransferOutcome {
    pub task: TransferTask,
    /// Bytes on disk after a successful transfer
    pub result: Result<u64, TransferError>,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

// ============================================================================
// TransferScheduler
// ============================================================================

/// Plans and runs transfers from the remote catalog into the local root
#[derive(Clone)]
pub struct TransferScheduler {
    catalog: Arc<dyn IRemoteCatalog>,
    local_root: PathBuf,
    max_retries: u32,
}

impl TransferScheduler {
    pub fn new(catalog: Arc<dyn IRemoteCatalog>, local_root: PathBuf, max_retries: u32) -> Self {
        Self {
            catalog,
            local_root,
            max_retries,
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Computes the transfer plan for `files`
    ///
    /// Runs the local size recheck and records its hits in `state`.
    /// Never suspends, so it is safe to call while holding the state lock.
    pub fn plan(&self, files: Vec<FileRecord>, state: &mut SyncState) -> TransferPlan {
        let mut plan = TransferPlan::default();
        let mut seen = HashSet::new();

        for record in files {
            if !seen.insert(record.remote_path.clone()) {
                debug!(remote_path = %record.remote_path, "duplicate catalog entry");
                continue;
            }
            if let Err(e) = record.validate() {
                warn!(remote_path = %record.remote_path, error = %e, "skipping invalid record");
                plan.invalid += 1;
                continue;
            }
            if state.is_synced(&record.remote_path) {
                continue;
            }

            let task = TransferTask::new(record, &self.local_root);
            if reconcile_local(&task, state) {
                plan.reconciled += 1;
                continue;
            }
            if state.is_retry_exhausted(task.remote_path(), self.max_retries) {
                debug!(
                    remote_path = %task.remote_path(),
                    retry_count = state.retry_count(task.remote_path()),
                    "retry limit reached, not scheduling"
                );
                plan.exhausted += 1;
                continue;
            }
            plan.tasks.push(task);
        }

        debug!(
            tasks = plan.tasks.len(),
            reconciled = plan.reconciled,
            exhausted = plan.exhausted,
            invalid = plan.invalid,
            "transfer plan computed"
        );
        plan
    }

    /// Resolves every retryable entry of the failure ledger against `files`
    ///
    /// Entries at the retry cap and entries the catalog no longer lists
    /// are left untouched in the ledger.
    pub fn plan_retry(&self, files: Vec<FileRecord>, state: &mut SyncState) -> RetryPlan {
        let mut plan = RetryPlan::default();
        let mut by_path: HashMap<String, FileRecord> = files
            .into_iter()
            .map(|r| (r.remote_path.as_str().to_string(), r))
            .collect();

        let failed: Vec<(String, u32)> = state
            .failed_downloads
            .iter()
            .map(|(path, f)| (path.clone(), f.retry_count))
            .collect();

        for (path, retry_count) in failed {
            if retry_count >= self.max_retries {
                warn!(remote_path = %path, retry_count, "too many failed attempts, skipping retry");
                if let Ok(remote) = RemotePath::new(path.as_str()) {
                    plan.exhausted.push(remote);
                }
                continue;
            }

            let Some(record) = by_path.remove(&path) else {
                debug!(remote_path = %path, "failed file no longer in catalog");
                plan.missing.push(path);
                continue;
            };
            if let Err(e) = record.validate() {
                warn!(remote_path = %path, error = %e, "skipping invalid record");
                continue;
            }

            let task = TransferTask::new(record, &self.local_root);
            if reconcile_local(&task, state) {
                plan.reconciled += 1;
            } else {
                plan.tasks.push(task);
            }
        }

        plan
    }

    /// Streams transfer outcomes in completion order, `limit` at a time
    pub fn stream(
        &self,
        tasks: Vec<TransferTask>,
        limit: usize,
    ) -> impl Stream<Item = TransferOutcome> + '_ {
        stream::iter(tasks)
            .map(move |task| self.transfer(task))
            .buffer_unordered(limit.max(1))
    }

    /// Runs `tasks` with at most `limit` in flight, calling `on_outcome`
    /// as each one completes
    pub async fn run_with<F>(&self, tasks: Vec<TransferTask>, limit: usize, mut on_outcome: F)
    where
        F: FnMut(TransferOutcome),
    {
        let mut outcomes = std::pin::pin!(self.stream(tasks, limit));
        while let Some(outcome) = outcomes.next().await {
            on_outcome(outcome);
        }
    }

    /// Runs `tasks` with at most `limit` in flight and collects the outcomes
    pub async fn run(&self, tasks: Vec<TransferTask>, limit: usize) -> Vec<TransferOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        self.run_with(tasks, limit, |outcome| outcomes.push(outcome))
            .await;
        outcomes
    }

    async fn transfer(&self, task: TransferTask) -> TransferOutcome {
        let started = Instant::now();
        let result = self.fetch(&task).await;

        match &result {
            Ok(bytes) => debug!(
                remote_path = %task.remote_path(),
                bytes,
                duration_ms = started.elapsed().as_millis() as u64,
                "transfer finished"
            ),
            Err(e) => warn!(
                remote_path = %task.remote_path(),
                error = %e,
                duration_ms = started.elapsed().as_millis() as u64,
                "transfer failed"
            ),
        }

        TransferOutcome { task, result }
    }

    async fn fetch(&self, task: &TransferTask) -> Result<u64, TransferError> {
        if let Some(parent) = task.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TransferError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        self.catalog
            .get(task.remote_path(), &task.destination)
            .await
            .map_err(TransferError::Download)?;

        let actual = tokio::fs::metadata(&task.destination)
            .await
            .map_err(|source| TransferError::Io {
                path: task.destination.clone(),
                source,
            })?
            .len();

        let expected = task.record.size;
        if expected != 0 && actual != expected {
            return Err(TransferError::SizeMismatch { expected, actual });
        }
        Ok(actual)
    }
}

/// Marks `task` synced if a local file of the recorded size already exists
fn reconcile_local(task: &TransferTask, state: &mut SyncState) -> bool {
    let Ok(metadata) = std::fs::metadata(&task.destination) else {
        return false;
    };
    if !metadata.is_file() || metadata.len() != task.record.size {
        return false;
    }

    debug!(remote_path = %task.remote_path(), "local copy already complete");
    state.mark_synced(
        task.remote_path(),
        &task.destination,
        metadata.len(),
        Utc::now(),
    );
    true
}
