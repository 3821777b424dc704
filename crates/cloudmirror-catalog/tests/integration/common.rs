//! Shared helpers for storage API integration tests
//!
//! Each helper mounts the endpoints a test needs on a wiremock server and
//! returns a RestCatalog pointed at it.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cloudmirror_catalog::{RestCatalog, S3Catalog, S3Credentials};

pub const BUCKET: &str = "cloudmirror-files";
pub const API_KEY: &str = "test-api-key";

/// Starts a mock storage service and returns a catalog for it
pub async fn setup_storage_mock() -> (MockServer, RestCatalog) {
    let server = MockServer::start().await;
    let catalog = RestCatalog::new(&server.uri(), BUCKET, API_KEY).expect("valid mock url");
    (server, catalog)
}

/// Mounts a single-page folder listing for `prefix`
pub async fn mount_folder(server: &MockServer, prefix: &str, entries: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/list/{BUCKET}")))
        .and(body_partial_json(serde_json::json!({ "prefix": prefix })))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}

pub fn folder(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "id": null,
        "updated_at": null,
        "created_at": null,
        "last_accessed_at": null,
        "metadata": null
    })
}

pub fn object(name: &str, size: u64, mimetype: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "id": format!("id-{name}"),
        "updated_at": "2026-03-01T10:00:00.000Z",
        "created_at": "2026-03-01T09:00:00.000Z",
        "last_accessed_at": "2026-03-01T10:00:00.000Z",
        "metadata": {
            "eTag": "\"abc\"",
            "size": size,
            "mimetype": mimetype,
            "cacheControl": "max-age=3600"
        }
    })
}

/// Mounts `GET` of one object
pub async fn mount_object(server: &MockServer, key: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/storage/v1/object/{BUCKET}/{key}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

pub const S3_BUCKET: &str = "files";

/// Starts a mock S3 endpoint and returns a path-style catalog for it
pub async fn setup_s3_mock() -> (MockServer, S3Catalog) {
    let server = MockServer::start().await;
    let catalog = S3Catalog::new(
        S3_BUCKET,
        "us-east-1",
        Some(&server.uri()),
        S3Credentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
        },
    );
    (server, catalog)
}

/// One `ListBucketResult` page
pub fn list_page(keys: &[(&str, u64)], next_token: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|(key, size)| {
            format!(
                "<Contents><Key>{key}</Key><LastModified>2026-03-01T10:00:00.000Z</LastModified>\
                 <ETag>&quot;abc&quot;</ETag><Size>{size}</Size><StorageClass>STANDARD</StorageClass></Contents>"
            )
        })
        .collect();
    let truncation = match next_token {
        Some(token) => format!(
            "<IsTruncated>true</IsTruncated><NextContinuationToken>{token}</NextContinuationToken>"
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <Name>{S3_BUCKET}</Name><Prefix>u1/</Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>\
         {truncation}{contents}</ListBucketResult>",
        keys.len()
    )
}

pub fn s3_xml(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_raw(body.into_bytes(), "application/xml")
}

pub fn s3_error(status: u16, code: &str) -> ResponseTemplate {
    s3_xml(
        status,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>{code}</Code><Message>{code}</Message><RequestId>req-1</RequestId></Error>"
        ),
    )
}
