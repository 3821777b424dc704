//! CLI subcommands
//!
//! Every command receives an [`AppContext`] holding the loaded
//! configuration. Adapters are only built by the commands that need them,
//! so `config` subcommands keep working on a broken configuration.

pub mod config;
pub mod files;
pub mod retry;
pub mod status;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cloudmirror_catalog::build_catalog;
use cloudmirror_core::config::Config;
use cloudmirror_core::domain::OwnerId;
use cloudmirror_core::ports::IRemoteCatalog;
use cloudmirror_notify::build_notifier;
use cloudmirror_state::JsonStateStore;
use cloudmirror_sync::{SyncEngine, SyncSettings};

/// Configuration shared by all commands
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
}

impl AppContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Fails with every validation error if the configuration is unusable
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.config.validate();
        if errors.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!(
            "Invalid configuration ({}): {}",
            self.config_path.display(),
            messages.join("; ")
        )
    }

    pub fn owner(&self) -> Result<OwnerId> {
        OwnerId::new(self.config.sync.owner_id.as_str()).context("Invalid sync.owner_id")
    }

    pub fn catalog(&self) -> Result<Arc<dyn IRemoteCatalog>> {
        self.ensure_valid()?;
        build_catalog(&self.config.catalog).context("Failed to set up catalog backend")
    }

    /// Wires catalog, ledger and notifier into a ready engine
    pub fn engine(&self) -> Result<SyncEngine> {
        self.ensure_valid()?;
        let sync = &self.config.sync;

        let catalog = build_catalog(&self.config.catalog).context("Failed to set up catalog backend")?;
        let store = Arc::new(JsonStateStore::for_root(&sync.root, &sync.state_file));
        let notifier =
            build_notifier(&self.config.notifier).context("Failed to set up event notifier")?;

        let engine = SyncEngine::initialize(
            self.owner()?,
            &sync.root,
            catalog,
            store,
            notifier,
            SyncSettings::from_config(&self.config),
        )?;
        Ok(engine)
    }
}
