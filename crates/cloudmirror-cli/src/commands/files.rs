//! Catalog commands - `list`, `upload` and `delete`
//!
//! These talk to the configured catalog backend directly; the sync ledger
//! is not touched. A deleted file that was already mirrored stays in the
//! local root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cloudmirror_core::domain::{RemotePath, UploadRequest};
use tracing::info;

use super::AppContext;
use crate::output::{get_formatter, human_size, plural, OutputFormat};

// ============================================================================
// list
// ============================================================================

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show files of this collection
    #[arg(long)]
    pub collection: Option<String>,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let owner = ctx.owner()?;
        let catalog = ctx.catalog()?;

        let mut files = catalog
            .list(&owner)
            .await
            .context("Failed to list catalog")?;
        if let Some(collection) = &self.collection {
            files.retain(|f| &f.collection_name == collection);
        }
        files.sort_by(|a, b| a.remote_path.cmp(&b.remote_path));

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::to_value(&files)?);
            return Ok(());
        }

        if files.is_empty() {
            formatter.success(&format!("No files in {} catalog", catalog.backend_name()));
            return Ok(());
        }

        formatter.success(&format!(
            "{} file{} in {} catalog",
            files.len(),
            plural(files.len()),
            catalog.backend_name()
        ));
        for file in &files {
            formatter.info(&format!(
                "{:<50} {:>10}  {}",
                file.remote_path.as_str(),
                human_size(file.size),
                file.uploaded_at.format("%Y-%m-%d %H:%M")
            ));
        }
        Ok(())
    }
}

// ============================================================================
// upload
// ============================================================================

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file to upload
    pub file: PathBuf,

    /// Collection the file belongs to
    #[arg(long)]
    pub collection: String,

    /// Name in the catalog (defaults to the local file name)
    #[arg(long)]
    pub filename: Option<String>,

    /// MIME type recorded with the file
    #[arg(long)]
    pub content_type: Option<String>,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let owner = ctx.owner()?;
        let catalog = ctx.catalog()?;

        if !self.file.is_file() {
            anyhow::bail!("{} is not a file", self.file.display());
        }
        let filename = match &self.filename {
            Some(name) => name.clone(),
            None => self
                .file
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .context("Cannot derive a file name, pass --filename")?,
        };

        let mut request = UploadRequest::new(owner, self.collection.as_str(), filename);
        if let Some(content_type) = &self.content_type {
            request = request.with_content_type(content_type.as_str());
        }

        info!(file = %self.file.display(), collection = %self.collection, "Uploading");
        let remote = catalog
            .put(&self.file, &request)
            .await
            .with_context(|| format!("Failed to upload {}", self.file.display()))?;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "remote_path": remote.as_str(),
                "backend": catalog.backend_name(),
            }));
        } else {
            formatter.success(&format!("Uploaded {}", remote));
        }
        Ok(())
    }
}

// ============================================================================
// delete
// ============================================================================

#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Remote path, `owner/collection/filename`
    pub remote_path: String,
}

impl DeleteCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let remote = RemotePath::new(self.remote_path.as_str()).context("Invalid remote path")?;
        let catalog = ctx.catalog()?;

        let deleted = catalog
            .delete(&remote)
            .await
            .with_context(|| format!("Failed to delete {}", remote))?;

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "deleted": deleted,
                "remote_path": remote.as_str(),
            }));
        } else if deleted {
            formatter.success(&format!("Deleted {}", remote));
        } else {
            formatter.warn(&format!("{} was not in the catalog", remote));
        }
        Ok(())
    }
}
