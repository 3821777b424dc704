//! cloudmirror Catalog - Remote catalog backends
//!
//! Implements the `IRemoteCatalog` port from `cloudmirror-core` for every
//! supported object store. The backend is chosen once, from configuration,
//! by [`build_catalog`]; the sync core only ever sees the trait object.
//!
//! ## Key Components
//!
//! - [`LocalCatalog`] - Directory-backed store with a `metadata.json` index
//! - [`RestCatalog`] - Storage REST API (`/storage/v1/object/...`) client
//! - [`S3Catalog`] - S3 and S3-compatible buckets
//! - [`CatalogError`] - Error types shared by every backend
//!
//! A remote backend configured without credentials is replaced by a
//! [`LocalCatalog`] at [`DEFAULT_LOCAL_ROOT`], with a warning.
//!
//! ## Usage
//!
//! ```no_run
//! use cloudmirror_core::config::CatalogConfig;
//! use cloudmirror_core::domain::OwnerId;
//! use cloudmirror_catalog::build_catalog;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = build_catalog(&CatalogConfig::default())?;
//! let files = catalog.list(&OwnerId::new("user-1")?).await?;
//! println!("{} files in {}", files.len(), catalog.backend_name());
//! # Ok(())
//! # }
//! ```

pub mod local;
pub mod rest;
pub mod s3;

use std::sync::Arc;

use cloudmirror_core::config::{CatalogConfig, DEFAULT_LOCAL_ROOT};
use cloudmirror_core::domain::DomainError;
use cloudmirror_core::ports::IRemoteCatalog;
use tracing::warn;

pub use local::LocalCatalog;
pub use rest::RestCatalog;
pub use s3::{S3Catalog, S3Credentials};

/// Environment variables consulted for S3 keys missing from the config
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// Errors that can occur during catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A local file or directory operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request could not be completed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service answered with an error status
    #[error("{operation} returned status {status}")]
    Status { operation: String, status: u16 },

    /// The metadata index could not be read or written
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// An S3 request failed
    #[error("S3 {operation} failed: {message}")]
    S3 { operation: String, message: String },

    /// A base URL or object key could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Upload metadata failed validation
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl CatalogError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Builds the catalog backend selected by `config`
///
/// S3 keys missing from the config are read from the process environment.
pub fn build_catalog(config: &CatalogConfig) -> Result<Arc<dyn IRemoteCatalog>, CatalogError> {
    build_catalog_with_env(config, |key| std::env::var(key).ok())
}

/// [`build_catalog`] with an explicit environment lookup
pub fn build_catalog_with_env(
    config: &CatalogConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn IRemoteCatalog>, CatalogError> {
    let catalog: Arc<dyn IRemoteCatalog> = match config {
        CatalogConfig::Local { root } => Arc::new(LocalCatalog::new(root.clone())),
        CatalogConfig::Rest { api_key, .. } if api_key.trim().is_empty() => {
            local_fallback("rest")
        }
        CatalogConfig::Rest {
            base_url,
            bucket,
            api_key,
        } => Arc::new(RestCatalog::new(base_url, bucket.clone(), api_key.clone())?),
        CatalogConfig::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
        } => match s3_credentials(access_key_id, secret_access_key, &env) {
            Some(credentials) => Arc::new(S3Catalog::new(
                bucket.clone(),
                region.clone(),
                endpoint.as_deref(),
                credentials,
            )),
            None => local_fallback("s3"),
        },
    };
    tracing::debug!(backend = catalog.backend_name(), "catalog backend selected");
    Ok(catalog)
}

/// Config keys win; otherwise both keys must come from the environment
fn s3_credentials(
    access_key_id: &Option<String>,
    secret_access_key: &Option<String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<S3Credentials> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let access_key_id = non_empty(access_key_id.clone()).or_else(|| non_empty(env(AWS_ACCESS_KEY_ID)))?;
    let secret_access_key =
        non_empty(secret_access_key.clone()).or_else(|| non_empty(env(AWS_SECRET_ACCESS_KEY)))?;
    Some(S3Credentials {
        access_key_id,
        secret_access_key,
    })
}

fn local_fallback(backend: &str) -> Arc<dyn IRemoteCatalog> {
    warn!(
        backend,
        root = DEFAULT_LOCAL_ROOT,
        "catalog credentials not configured, falling back to local storage"
    );
    Arc::new(LocalCatalog::new(DEFAULT_LOCAL_ROOT))
}
