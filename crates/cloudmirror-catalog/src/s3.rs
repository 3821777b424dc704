//! S3 catalog
//!
//! Objects live in one bucket under `owner/collection/filename`. The bucket
//! listing is the catalog: sizes and timestamps come from `ListObjectsV2`,
//! and keys that are not exactly three safe segments are ignored.
//!
//! A custom `endpoint` switches to path-style addressing for MinIO and
//! other S3-compatible stores.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, TimeZone, Utc};
use cloudmirror_core::domain::{FileRecord, OwnerId, RemotePath, UploadRequest};
use cloudmirror_core::ports::IRemoteCatalog;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::CatalogError;

/// Static access key pair
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Catalog backed by an S3 bucket
#[derive(Debug, Clone)]
pub struct S3Catalog {
    client: S3Client,
    bucket: String,
}

impl S3Catalog {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<&str>,
        credentials: S3Credentials,
    ) -> Self {
        let credentials = Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            None,
            None,
            "cloudmirror",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .region(Region::new(region.into()))
            .credentials_provider(credentials)
            .behavior_version_latest();
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn sdk_error<E, R>(operation: String, err: SdkError<E, R>) -> CatalogError
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        CatalogError::S3 {
            operation,
            message: DisplayErrorContext(err).to_string(),
        }
    }

    /// Maps one listed object to a record, if its key is `owner/collection/filename`
    fn to_record(owner: &OwnerId, object: &Object) -> Result<Option<FileRecord>, CatalogError> {
        let Some(key) = object.key() else {
            return Ok(None);
        };
        let segments: Vec<&str> = key.split('/').collect();
        let [prefix, collection, filename] = segments.as_slice() else {
            debug!(key, "ignoring object outside owner/collection/filename layout");
            return Ok(None);
        };
        if *prefix != owner.as_str() || filename.is_empty() {
            return Ok(None);
        }

        let remote_path = RemotePath::derive(owner, collection, filename)?;
        let record = FileRecord {
            owner_id: owner.clone(),
            collection_name: (*collection).to_string(),
            filename: (*filename).to_string(),
            size: object
                .size()
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or(0),
            content_type: String::new(),
            remote_path,
            local_path: None,
            uploaded_at: object
                .last_modified()
                .and_then(|at| to_utc(at.secs(), at.subsec_nanos()))
                .unwrap_or_default(),
            synced_at: None,
            source: "unknown".to_string(),
            origin_message_id: None,
            origin_url: None,
        };
        record.validate()?;
        Ok(Some(record))
    }

    async fn list_owner(&self, owner: &OwnerId) -> Result<Vec<FileRecord>, CatalogError> {
        let prefix = format!("{owner}/");
        let mut records = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| Self::sdk_error(format!("list {prefix}"), e))?;

            for object in page.contents() {
                match Self::to_record(owner, object) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(e) => warn!(key = ?object.key(), error = %e, "skipping invalid catalog object"),
                }
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(records)
    }

    async fn download(&self, remote_path: &RemotePath, local_dest: &Path) -> Result<u64, CatalogError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(remote_path.as_str())
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => {
                return Err(CatalogError::NotFound(remote_path.to_string()));
            }
            Err(e) => return Err(Self::sdk_error(format!("download {remote_path}"), e)),
        };

        let mut file = tokio::fs::File::create(local_dest)
            .await
            .map_err(|e| CatalogError::io(local_dest, e))?;
        let mut body = response.body;
        let mut written = 0u64;

        while let Some(chunk) = body.try_next().await.map_err(|e| CatalogError::S3 {
            operation: format!("download {remote_path}"),
            message: e.to_string(),
        })? {
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
        let body = ByteStream::from_path(local_src)
            .await
            .map_err(|e| CatalogError::S3 {
                operation: format!("read {}", local_src.display()),
                message: e.to_string(),
            })?;
        let content_type =
            (!request.content_type.is_empty()).then(|| request.content_type.clone());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(remote_path.as_str())
            .set_content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| Self::sdk_error(format!("upload {remote_path}"), e))?;

        info!(remote_path = %remote_path, bucket = %self.bucket, "uploaded object");
        Ok(remote_path)
    }

    /// S3 deletes are idempotent, so presence is checked with a HEAD first
    async fn remove(&self, remote_path: &RemotePath) -> Result<bool, CatalogError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(remote_path.as_str())
            .send()
            .await;
        if let Err(e) = head {
            let service_err = e.into_service_error();
            if service_err.is_not_found() {
                return Ok(false);
            }
            return Err(CatalogError::S3 {
                operation: format!("head {remote_path}"),
                message: service_err.to_string(),
            });
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(remote_path.as_str())
            .send()
            .await
            .map_err(|e| Self::sdk_error(format!("delete {remote_path}"), e))?;
        Ok(true)
    }
}

fn is_not_found<E>(err: &SdkError<E, aws_sdk_s3::config::http::HttpResponse>) -> bool {
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == 404)
}

fn to_utc(secs: i64, nanos: u32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, nanos).single()
}

#[async_trait]
impl IRemoteCatalog for S3Catalog {
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
        "s3"
    }
}
