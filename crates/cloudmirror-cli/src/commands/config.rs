//! Config command - Inspect and validate cloudmirror configuration
//!
//! - `show` prints the effective configuration (YAML or JSON)
//! - `validate` loads the file strictly and reports every error
//! - `path` prints where the configuration is read from

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use cloudmirror_core::config::{Config, ValidationError};
use tracing::info;

use super::AppContext;
use crate::output::{get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        match self {
            ConfigCommand::Show => show(ctx, format, &*formatter),
            ConfigCommand::Validate => validate(&ctx.config_path, format, &*formatter),
            ConfigCommand::Path => {
                if format == OutputFormat::Json {
                    formatter.print_json(&serde_json::json!({
                        "config_path": ctx.config_path.display().to_string(),
                        "exists": ctx.config_path.exists(),
                    }));
                } else {
                    println!("{}", ctx.config_path.display());
                }
                Ok(())
            }
        }
    }
}

fn show(ctx: &AppContext, format: OutputFormat, formatter: &dyn OutputFormatter) -> Result<()> {
    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if format == OutputFormat::Json {
        let json = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
    if !ctx.config_path.exists() {
        formatter.warn("File not found, showing defaults");
    }
    formatter.info("");
    let yaml =
        serde_yaml::to_string(&ctx.config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn validate(path: &Path, format: OutputFormat, formatter: &dyn OutputFormatter) -> Result<()> {
    // load strictly so parse errors surface instead of silently using defaults
    let errors: Vec<String> = match Config::load(path) {
        Ok(config) => {
            info!(config_path = %path.display(), "Validating configuration");
            config.validate().iter().map(ValidationError::to_string).collect()
        }
        Err(_) if !path.exists() => vec![format!("Configuration file not found: {}", path.display())],
        Err(e) => vec![format!("Failed to parse configuration: {e:#}")],
    };

    if format == OutputFormat::Json {
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path.display().to_string(),
            "errors": errors,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            plural(errors.len())
        ));
        formatter.info(&format!("File: {}", path.display()));
        for error in &errors {
            formatter.info(&format!("  - {}", error));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}
