//! Configuration module for cloudmirror.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for cloudmirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub catalog: CatalogConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Account whose files are mirrored.
    pub owner_id: String,
    /// Root directory of the local mirror.
    pub root: PathBuf,
    /// Seconds between passes in perpetual mode.
    pub interval_secs: u64,
    /// Maximum number of transfers in flight.
    pub max_concurrent: usize,
    /// Consecutive failures after which a file is no longer retried automatically.
    pub max_retries: u32,
    /// Seconds to wait after a failed pass before trying again.
    pub error_cooldown_secs: u64,
    /// Whether passes run at all.
    pub enabled: bool,
    /// File name of the sync ledger, created inside `root`.
    pub state_file: String,
}

/// Remote catalog backend, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CatalogConfig {
    /// Files and `metadata.json` kept in a local directory.
    Local {
        /// Directory that acts as the object store.
        root: PathBuf,
    },
    /// Storage REST API (`/storage/v1/object/...`).
    ///
    /// An empty `api_key` makes the catalog fall back to [`DEFAULT_LOCAL_ROOT`].
    Rest {
        /// Base URL of the storage service, e.g. `https://project.supabase.co`.
        base_url: String,
        /// Bucket holding the files.
        #[serde(default = "default_bucket")]
        bucket: String,
        /// Bearer token sent with every request.
        #[serde(default)]
        api_key: String,
    },
    /// S3 or an S3-compatible object store.
    ///
    /// Keys left unset here are read from `AWS_ACCESS_KEY_ID` /
    /// `AWS_SECRET_ACCESS_KEY`; with neither, the catalog falls back to
    /// [`DEFAULT_LOCAL_ROOT`].
    S3 {
        #[serde(default = "default_bucket")]
        bucket: String,
        #[serde(default = "default_region")]
        region: String,
        /// Custom endpoint (MinIO, R2, ...); enables path-style addressing.
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
    },
}

/// Directory used by the default catalog and by credential-less fallbacks.
pub const DEFAULT_LOCAL_ROOT: &str = "cloud_storage";

fn default_bucket() -> String {
    "cloudmirror-files".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Outbound event notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Base URL of the consumer. `None` disables notifications.
    pub url: Option<String>,
    /// Path appended to `url` for every event.
    pub endpoint: String,
    /// Upper bound for one delivery attempt (in seconds).
    pub timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cloudmirror/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cloudmirror")
            .join("config.yaml")
    }

    /// Full path of the sync ledger for the configured root.
    pub fn state_path(&self) -> PathBuf {
        self.sync.root.join(&self.sync.state_file)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            owner_id: String::new(),
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Downloads")
                .join("cloudmirror"),
            interval_secs: 300,
            max_concurrent: 3,
            max_retries: 3,
            error_cooldown_secs: 60,
            enabled: true,
            state_file: ".sync_state.json".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig::Local {
            root: PathBuf::from(DEFAULT_LOCAL_ROOT),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            endpoint: "/api/sync/notification".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            });
        };

        // --- sync ---
        if self.sync.owner_id.trim().is_empty() {
            push("sync.owner_id", "must be set".into());
        } else if crate::domain::OwnerId::new(self.sync.owner_id.clone()).is_err() {
            push(
                "sync.owner_id",
                format!("not a valid owner id: {:?}", self.sync.owner_id),
            );
        }
        if self.sync.interval_secs == 0 {
            push("sync.interval_secs", "must be greater than 0".into());
        }
        if self.sync.max_concurrent == 0 {
            push("sync.max_concurrent", "must be greater than 0".into());
        }
        if self.sync.max_retries == 0 {
            push("sync.max_retries", "must be greater than 0".into());
        }
        if self.sync.error_cooldown_secs == 0 {
            push("sync.error_cooldown_secs", "must be greater than 0".into());
        }
        if self.sync.state_file.is_empty() || self.sync.state_file.contains('/') {
            push(
                "sync.state_file",
                "must be a plain file name inside sync.root".into(),
            );
        }

        // --- catalog ---
        match &self.catalog {
            CatalogConfig::Local { root } => {
                if root.as_os_str().is_empty() {
                    push("catalog.root", "must not be empty".into());
                }
            }
            CatalogConfig::Rest {
                base_url, bucket, ..
            } => {
                if !is_http_url(base_url) {
                    push(
                        "catalog.base_url",
                        format!("must be an http(s) URL: {base_url:?}"),
                    );
                }
                if bucket.is_empty() {
                    push("catalog.bucket", "must not be empty".into());
                }
            }
            CatalogConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
            } => {
                if bucket.is_empty() {
                    push("catalog.bucket", "must not be empty".into());
                }
                if region.is_empty() {
                    push("catalog.region", "must not be empty".into());
                }
                if let Some(endpoint) = endpoint {
                    if !is_http_url(endpoint) {
                        push(
                            "catalog.endpoint",
                            format!("must be an http(s) URL: {endpoint:?}"),
                        );
                    }
                }
                if access_key_id.is_some() != secret_access_key.is_some() {
                    push(
                        "catalog.secret_access_key",
                        "access_key_id and secret_access_key must be set together".into(),
                    );
                }
            }
        }

        // --- notifier ---
        if let Some(url) = &self.notifier.url {
            if !is_http_url(url) {
                push("notifier.url", format!("must be an http(s) URL: {url:?}"));
            }
        }
        if !self.notifier.endpoint.starts_with('/') {
            push("notifier.endpoint", "must start with '/'".into());
        }
        if self.notifier.timeout_secs == 0 || self.notifier.timeout_secs > 60 {
            push("notifier.timeout_secs", "must be in range 1..=60".into());
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use cloudmirror_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .owner_id("user-1")
///     .sync_root(PathBuf::from("/tmp/mirror"))
///     .interval_secs(60)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.sync.interval_secs, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.config.sync.owner_id = owner_id.into();
        self
    }

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.config.sync.max_concurrent = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.sync.max_retries = n;
        self
    }

    pub fn error_cooldown_secs(mut self, seconds: u64) -> Self {
        self.config.sync.error_cooldown_secs = seconds;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.sync.enabled = enabled;
        self
    }

    // --- catalog ---

    pub fn local_catalog(mut self, root: PathBuf) -> Self {
        self.config.catalog = CatalogConfig::Local { root };
        self
    }

    pub fn rest_catalog(
        mut self,
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.config.catalog = CatalogConfig::Rest {
            base_url: base_url.into(),
            bucket: bucket.into(),
            api_key: api_key.into(),
        };
        self
    }

    /// S3 catalog with credentials taken from the environment.
    pub fn s3_catalog(mut self, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        self.config.catalog = CatalogConfig::S3 {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        };
        self
    }

    // --- notifier ---

    pub fn notifier_url(mut self, url: impl Into<String>) -> Self {
        self.config.notifier.url = Some(url.into());
        self
    }

    pub fn notifier_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.notifier.timeout_secs = seconds;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
