//! cloudmirror CLI - Command-line interface for cloudmirror
//!
//! Provides commands for:
//! - Running one sync pass or the perpetual sync loop
//! - Viewing sync status and retrying failed downloads
//! - Listing, uploading and deleting catalog files
//! - Inspecting and validating configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudmirror_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand,
    files::{DeleteCommand, ListCommand, UploadCommand},
    retry::RetryCommand,
    status::StatusCommand,
    sync::SyncCommand,
    watch::WatchCommand,
    AppContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "cloudmirror", version, about = "Mirror a cloud file catalog to a local directory")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one sync pass
    Sync(SyncCommand),
    /// Sync periodically until interrupted
    Watch(WatchCommand),
    /// Show synchronization status
    Status(StatusCommand),
    /// Retry failed downloads
    Retry(RetryCommand),
    /// List the files the catalog holds for the owner
    List(ListCommand),
    /// Put a local file into the catalog
    Upload(UploadCommand),
    /// Remove a file from the catalog
    Delete(DeleteCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = match cli.config {
        Some(path) => {
            let config = Config::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, path)
        }
        None => {
            let path = Config::default_path();
            (Config::load_or_default(&path), path)
        }
    };

    // Setup tracing
    let level = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if cli.log_json || config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = AppContext::new(config, config_path);

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx, format).await,
        Commands::Watch(cmd) => cmd.execute(&ctx, format).await,
        Commands::Status(cmd) => cmd.execute(&ctx, format).await,
        Commands::Retry(cmd) => cmd.execute(&ctx, format).await,
        Commands::List(cmd) => cmd.execute(&ctx, format).await,
        Commands::Upload(cmd) => cmd.execute(&ctx, format).await,
        Commands::Delete(cmd) => cmd.execute(&ctx, format).await,
        Commands::Config(cmd) => cmd.execute(&ctx, format).await,
    }
}
