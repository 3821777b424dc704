//! Status command - Display synchronization status

use anyhow::Result;
use clap::Args;

use super::AppContext;
use crate::output::{get_formatter, human_size, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let status = ctx.engine()?.status();

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&status)?);
            return Ok(());
        }

        let last_sync = status
            .last_sync
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());

        formatter.success(&format!("Owner {}", status.owner_id));
        formatter.info(&format!("Local root:   {}", status.local_root.display()));
        formatter.info(&format!("Backend:      {}", status.backend));
        formatter.info(&format!(
            "Enabled:      {}",
            if status.enabled { "yes" } else { "no" }
        ));
        formatter.info(&format!("Interval:     {}s", status.interval_secs));
        formatter.info(&format!("Last sync:    {}", last_sync));
        formatter.info(&format!(
            "Synced:       {} files ({})",
            status.total_synced,
            human_size(status.total_size)
        ));
        formatter.info(&format!("State file:   {}", status.state_file.display()));

        if status.failed_downloads > 0 {
            formatter.warn(&format!(
                "{} failed download(s), run 'cloudmirror retry'",
                status.failed_downloads
            ));
        }

        Ok(())
    }
}
