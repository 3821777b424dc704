//! Storage REST API catalog
//!
//! Talks to an object storage service exposing the
//! `/storage/v1/object/{bucket}/{key}` API (Supabase Storage and compatible
//! servers).
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get`     | `GET    /storage/v1/object/{bucket}/{key}` (body streamed to disk) |
//! | `put`     | `POST   /storage/v1/object/{bucket}/{key}` with `x-upsert: true` |
//! | `delete`  | `DELETE /storage/v1/object/{bucket}/{key}` |
//! | `list`    | `POST   /storage/v1/object/list/{bucket}` per folder |
//!
//! Objects are keyed `owner/collection/filename`, so listing walks the
//! owner's folder for collections and then each collection for files.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudmirror_core::domain::{FileRecord, OwnerId, RemotePath, UploadRequest};
use cloudmirror_core::ports::IRemoteCatalog;
use futures_util::StreamExt;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::CatalogError;

/// Page size used for folder listings
const LIST_PAGE_SIZE: usize = 1000;

// ============================================================================
// Storage API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

/// One entry of a folder listing; folders carry no id and no metadata
#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

impl ListEntry {
    fn is_folder(&self) -> bool {
        self.id.is_none() && self.metadata.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    mimetype: Option<String>,
}

// ============================================================================
// RestCatalog
// ============================================================================

/// Catalog backed by a storage REST API
#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: Client,
    base_url: Url,
    bucket: String,
    api_key: String,
}

impl RestCatalog {
    /// Creates a client for `bucket` on the service at `base_url`
    pub fn new(
        base_url: &str,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let base_url =
            Url::parse(base_url).map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Builds `{base}/storage/v1/object/{prefix...}/{segments...}` with
    /// every segment percent-encoded
    fn endpoint<'a>(
        &self,
        prefix: &[&str],
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty()
                .extend(["storage", "v1", "object"])
                .extend(prefix)
                .extend(segments);
        }
        Ok(url)
    }

    fn object_url(&self, remote_path: &RemotePath) -> Result<Url, CatalogError> {
        self.endpoint(&[self.bucket.as_str()], remote_path.segments())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }

    /// Lists one folder of the bucket, following pagination
    async fn list_folder(&self, prefix: &str) -> Result<Vec<ListEntry>, CatalogError> {
        let url = self.endpoint(&["list", self.bucket.as_str()], [])?;
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let body = ListRequest {
                prefix,
                limit: LIST_PAGE_SIZE,
                offset,
                sort_by: SortBy {
                    column: "name",
                    order: "asc",
                },
            };
            let response = self.request(Method::POST, url.clone()).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::Status {
                    operation: format!("list {prefix}"),
                    status: status.as_u16(),
                });
            }

            let page: Vec<ListEntry> = response.json().await?;
            let page_len = page.len();
            entries.extend(page);
            if page_len < LIST_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        debug!(prefix, count = entries.len(), "listed folder");
        Ok(entries)
    }

    fn to_record(
        owner: &OwnerId,
        collection: &str,
        entry: ListEntry,
    ) -> Result<FileRecord, CatalogError> {
        let remote_path = RemotePath::derive(owner, collection, &entry.name)?;
        let metadata = entry.metadata.unwrap_or(ObjectMetadata {
            size: 0,
            mimetype: None,
        });
        let record = FileRecord {
            owner_id: owner.clone(),
            collection_name: collection.to_string(),
            filename: entry.name,
            size: metadata.size,
            content_type: metadata.mimetype.unwrap_or_default(),
            remote_path,
            local_path: None,
            uploaded_at: entry.created_at.or(entry.updated_at).unwrap_or_default(),
            synced_at: None,
            source: "unknown".to_string(),
            origin_message_id: None,
            origin_url: None,
        };
        record.validate()?;
        Ok(record)
    }

    async fn list_owner(&self, owner: &OwnerId) -> Result<Vec<FileRecord>, CatalogError> {
        let mut records = Vec::new();
        let collections = self.list_folder(&format!("{owner}/")).await?;

        for collection in collections.into_iter().filter(ListEntry::is_folder) {
            let prefix = format!("{owner}/{}/", collection.name);
            for entry in self.list_folder(&prefix).await? {
                if entry.is_folder() {
                    debug!(prefix = %prefix, name = %entry.name, "ignoring nested folder");
                    continue;
                }
                match Self::to_record(owner, &collection.name, entry) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(prefix = %prefix, error = %e, "skipping invalid catalog object"),
                }
            }
        }

        Ok(records)
    }

    async fn download(&self, remote_path: &RemotePath, local_dest: &Path) -> Result<u64, CatalogError> {
        let response = self
            .request(Method::GET, self.object_url(remote_path)?)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(remote_path.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                operation: format!("download {remote_path}"),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(local_dest)
            .await
            .map_err(|e| CatalogError::io(local_dest, e))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CatalogError::io(local_dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| CatalogError::io(local_dest, e))?;

        Ok(written)
    }

    async fn upload(
        &self,
        local_src: &Path,
        request: &UploadRequest,
    ) -> Result<RemotePath, CatalogError> {
        let remote_path = request.remote_path()?;
        let data = tokio::fs::read(local_src)
            .await
            .map_err(|e| CatalogError::io(local_src, e))?;
        let size = data.len();

        let response = self
            .request(Method::POST, self.object_url(&remote_path)?)
            .header("content-type", &request.content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                operation: format!("upload {remote_path}"),
                status: status.as_u16(),
            });
        }

        info!(remote_path = %remote_path, size, "uploaded object");
        Ok(remote_path)
    }

    async fn remove(&self, remote_path: &RemotePath) -> Result<bool, CatalogError> {
        let response = self
            .request(Method::DELETE, self.object_url(remote_path)?)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                operation: format!("delete {remote_path}"),
                status: status.as_u16(),
            });
        }
        Ok(true)
    }
}

#[async_trait]
impl IRemoteCatalog for RestCatalog {
    #[instrument(skip(self), fields(owner = %owner, bucket = %self.bucket))]
    async fn list(&self, owner: &OwnerId) -> anyhow::Result<Vec<FileRecord>> {
        let records = self.list_owner(owner).await?;
        debug!(count = records.len(), "listed catalog");
        Ok(records)
    }

    #[instrument(skip(self, local_dest), fields(remote_path = %remote_path))]
    async fn get(&self, remote_path: &RemotePath, local_dest: &Path) -> anyhow::Result<()> {
        let bytes = self.download(remote_path, local_dest).await?;
        debug!(bytes, "downloaded object");
        Ok(())
    }

    async fn put(&self, local_src: &Path, request: &UploadRequest) -> anyhow::Result<RemotePath> {
        Ok(self.upload(local_src, request).await?)
    }

    #[instrument(skip(self), fields(remote_path = %remote_path))]
    async fn delete(&self, remote_path: &RemotePath) -> anyhow::Result<bool> {
        Ok(self.remove(remote_path).await?)
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}
