//! Retry command - Re-attempt failed downloads
//!
//! Files that already failed `sync.max_retries` times are reported as
//! skipped and left in the failure ledger.

use anyhow::Result;
use clap::Args;
use cloudmirror_sync::RetryOutcome;

use super::AppContext;
use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct RetryCommand {}

impl RetryCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let engine = ctx.engine()?;
        let outcome = engine.retry_failed().await;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else {
            match &outcome {
                RetryOutcome::Completed(summary) => {
                    formatter.success(&format!(
                        "Retried {} file{}",
                        summary.total_retries,
                        plural(summary.total_retries)
                    ));
                    formatter.info(&format!("Recovered: {}", summary.successful));
                    formatter.info(&format!("Failed:    {}", summary.failed));
                    if summary.skipped > 0 {
                        formatter.warn(&format!(
                            "{} file{} reached the retry limit and {} skipped",
                            summary.skipped,
                            plural(summary.skipped),
                            if summary.skipped == 1 { "was" } else { "were" }
                        ));
                    }
                }
                RetryOutcome::NoFailedDownloads => formatter.success("No failed downloads"),
                RetryOutcome::Error { error } => formatter.error(error),
            }
        }

        match outcome {
            RetryOutcome::Error { error } => anyhow::bail!("Retry failed: {error}"),
            _ => Ok(()),
        }
    }
}
