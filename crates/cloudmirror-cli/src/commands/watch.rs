//! Watch command - Perpetual sync mode
//!
//! Runs a pass every `sync.interval_secs` (or `--interval`) until SIGINT or
//! SIGTERM. A failed pass is retried after `sync.error_cooldown_secs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use cloudmirror_sync::run_periodic;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Seconds between passes (overrides sync.interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let engine = Arc::new(ctx.engine()?);

        let settings = engine.settings().clone();
        let interval = self
            .interval
            .map(Duration::from_secs)
            .unwrap_or(settings.interval);
        if interval.is_zero() {
            anyhow::bail!("--interval must be greater than zero");
        }

        formatter.info(&format!(
            "Watching {} every {}s (Ctrl+C to stop)",
            engine.owner(),
            interval.as_secs()
        ));

        let shutdown = CancellationToken::new();
        tokio::spawn(shutdown_signal(shutdown.clone()));

        run_periodic(engine.clone(), interval, settings.error_cooldown, shutdown).await;

        let status = engine.status();
        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&status)?);
        } else {
            formatter.success(&format!(
                "Stopped, {} files mirrored, {} failed",
                status.total_synced, status.failed_downloads
            ));
        }
        Ok(())
    }
}

/// Cancels `token` on SIGINT or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
