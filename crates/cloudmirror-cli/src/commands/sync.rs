//! Sync command - Run one sync pass
//!
//! Lists the catalog, downloads every file not yet in the local mirror and
//! prints the pass outcome.

use anyhow::Result;
use clap::Args;
use cloudmirror_sync::PassOutcome;

use super::AppContext;
use crate::output::{get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let engine = ctx.engine()?;

        formatter.info(&format!(
            "Syncing {} into {}...",
            engine.owner(),
            engine.local_root().display()
        ));
        let outcome = engine.run_once().await;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else {
            print_pass(&*formatter, &outcome);
        }

        match outcome {
            PassOutcome::Error { error } => anyhow::bail!("Sync pass failed: {error}"),
            _ => Ok(()),
        }
    }
}

/// Human rendering of a pass outcome, shared with `watch`
pub(crate) fn print_pass(formatter: &dyn OutputFormatter, outcome: &PassOutcome) {
    match outcome {
        PassOutcome::Completed(summary) => {
            formatter.success(&format!(
                "Sync completed in {:.1}s",
                summary.duration_secs
            ));
            formatter.info(&format!(
                "Downloaded: {} file{}",
                summary.successful,
                plural(summary.successful)
            ));
            if summary.failed > 0 {
                formatter.warn(&format!(
                    "{} file{} failed, run 'cloudmirror retry' to try again",
                    summary.failed,
                    plural(summary.failed)
                ));
            }
        }
        PassOutcome::NoNewFiles => formatter.success("Already up to date"),
        PassOutcome::Disabled => formatter.warn("Sync is disabled (sync.enabled = false)"),
        PassOutcome::Error { error } => formatter.error(error),
    }
}
