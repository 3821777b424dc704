//! S3 backend against a path-style mock endpoint

use cloudmirror_catalog::CatalogError;
use cloudmirror_core::domain::{OwnerId, RemotePath, UploadRequest};
use cloudmirror_core::ports::IRemoteCatalog;
use wiremock::matchers::{header, method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn bucket_path() -> String {
    format!(r"^/{}/?$", common::S3_BUCKET)
}

#[tokio::test]
async fn test_list_walks_pages_and_keeps_owner_layout() {
    let (server, catalog) = common::setup_s3_mock().await;

    Mock::given(method("GET"))
        .and(path_regex(bucket_path()))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", "u1/"))
        .and(query_param_is_missing("continuation-token"))
        .respond_with(common::s3_xml(
            200,
            common::list_page(
                &[("u1/news/a.mp4", 3), ("u1/news/", 0), ("u1/stray.txt", 1)],
                Some("page-2"),
            ),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(bucket_path()))
        .and(query_param("continuation-token", "page-2"))
        .respond_with(common::s3_xml(
            200,
            common::list_page(&[("u1/docs/b.pdf", 10), ("u1/a/b/c.txt", 1)], None),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut files = catalog.list(&OwnerId::new("u1").unwrap()).await.unwrap();
    files.sort_by(|a, b| a.remote_path.cmp(&b.remote_path));

    let keys: Vec<&str> = files.iter().map(|f| f.remote_path.as_str()).collect();
    assert_eq!(keys, vec!["u1/docs/b.pdf", "u1/news/a.mp4"]);
    assert_eq!(files[0].collection_name, "docs");
    assert_eq!(files[0].size, 10);
    assert_eq!(files[1].size, 3);
    assert_eq!(
        files[1].uploaded_at.to_rfc3339(),
        "2026-03-01T10:00:00+00:00"
    );
    assert!(files.iter().all(|f| f.validate().is_ok()));
}

#[tokio::test]
async fn test_list_access_denied_is_an_error() {
    let (server, catalog) = common::setup_s3_mock().await;
    Mock::given(method("GET"))
        .and(path_regex(bucket_path()))
        .respond_with(common::s3_error(403, "AccessDenied"))
        .mount(&server)
        .await;

    let err = catalog
        .list(&OwnerId::new("u1").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::S3 { .. })
    ));
}

#[tokio::test]
async fn test_get_streams_object_to_destination() {
    let (server, catalog) = common::setup_s3_mock().await;
    let content: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    Mock::given(method("GET"))
        .and(path(format!("/{}/u1/news/a.mp4", common::S3_BUCKET)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(content.clone(), "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.mp4");
    catalog
        .get(&RemotePath::new("u1/news/a.mp4").unwrap(), &dest)
        .await
        .expect("download should succeed");
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_get_missing_key_is_not_found() {
    let (server, catalog) = common::setup_s3_mock().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/u1/news/gone.mp4", common::S3_BUCKET)))
        .respond_with(common::s3_error(404, "NoSuchKey"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = catalog
        .get(
            &RemotePath::new("u1/news/gone.mp4").unwrap(),
            &dir.path().join("gone.mp4"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::NotFound(_))
    ));
    assert!(!dir.path().join("gone.mp4").exists());
}

#[tokio::test]
async fn test_put_stores_under_owner_collection_filename() {
    let (server, catalog) = common::setup_s3_mock().await;
    Mock::given(method("PUT"))
        .and(path(format!("/{}/u1/docs/a.pdf", common::S3_BUCKET)))
        .and(header("content-type", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"abc\""))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.pdf");
    std::fs::write(&src, b"%PDF-1.7").unwrap();

    let request = UploadRequest::new(OwnerId::new("u1").unwrap(), "docs", "a.pdf")
        .with_content_type("application/pdf");
    let remote = catalog.put(&src, &request).await.unwrap();
    assert_eq!(remote.as_str(), "u1/docs/a.pdf");
}

#[tokio::test]
async fn test_delete_existing_object() {
    let (server, catalog) = common::setup_s3_mock().await;
    let key = format!("/{}/u1/news/a.mp4", common::S3_BUCKET);
    Mock::given(method("HEAD"))
        .and(path(key.clone()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(key))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = catalog
        .delete(&RemotePath::new("u1/news/a.mp4").unwrap())
        .await
        .unwrap();
    assert!(deleted);
}

#[tokio::test]
async fn test_delete_missing_object_returns_false() {
    let (server, catalog) = common::setup_s3_mock().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let deleted = catalog
        .delete(&RemotePath::new("u1/news/gone.mp4").unwrap())
        .await
        .unwrap();
    assert!(!deleted);
}
