//! JSON file implementation of `ISyncStateStore`
//!
//! The ledger is written to `<file>.tmp` in the same directory, flushed to
//! disk, and then renamed over the target. A crash at any point leaves
//! either the old or the new ledger in place, never a torn one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cloudmirror_core::domain::SyncState;
use cloudmirror_core::ports::ISyncStateStore;
use tracing::{debug, warn};

use crate::StateError;

/// Sync ledger stored as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the ledger named `file_name` inside the mirror `root`
    pub fn for_root(root: &Path, file_name: &str) -> Self {
        Self::new(root.join(file_name))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.as_os_str().to_owned();
        p.push(".tmp");
        PathBuf::from(p)
    }

    /// Reads and decodes the ledger file
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn read(&self) -> Result<Option<SyncState>, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::io(&self.path, e)),
        };
        let mut state: SyncState = serde_json::from_str(&content)?;
        if state.reconcile_totals() {
            debug!(path = %self.path.display(), "repaired drifted ledger counters");
        }
        Ok(Some(state))
    }

    fn write(&self, state: &SyncState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }

        let data = serde_json::to_vec_pretty(state)?;
        let tmp_path = self.tmp_path();

        {
            let mut file = File::create(&tmp_path).map_err(|e| StateError::io(&tmp_path, e))?;
            file.write_all(&data)
                .map_err(|e| StateError::io(&tmp_path, e))?;
            file.sync_all().map_err(|e| StateError::io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| StateError::io(&self.path, e))?;
        Ok(())
    }
}

impl ISyncStateStore for JsonStateStore {
    fn load(&self) -> SyncState {
        match self.read() {
            Ok(Some(state)) => {
                debug!(
                    path = %self.path.display(),
                    synced = state.total_synced,
                    failed = state.failed_count(),
                    "loaded sync ledger"
                );
                state
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no sync ledger yet, starting fresh");
                SyncState::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable sync ledger, starting fresh");
                SyncState::new()
            }
        }
    }

    fn save(&self, state: &SyncState) -> anyhow::Result<()> {
        self.write(state)?;
        debug!(path = %self.path.display(), synced = state.total_synced, "saved sync ledger");
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
