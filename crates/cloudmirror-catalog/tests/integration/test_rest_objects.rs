//! Object-level operations: streamed get, upsert put, delete

use cloudmirror_catalog::CatalogError;
use cloudmirror_core::domain::{OwnerId, RemotePath, UploadRequest};
use cloudmirror_core::ports::IRemoteCatalog;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_get_streams_body_to_destination() {
    let (server, catalog) = common::setup_storage_mock().await;
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    common::mount_object(&server, "u1/news/a.mp4", &content).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.mp4");
    std::fs::write(&dest, b"stale partial data that is longer than nothing").unwrap();

    catalog
        .get(&RemotePath::new("u1/news/a.mp4").unwrap(), &dest)
        .await
        .expect("download should succeed");

    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_get_missing_object() {
    let (server, catalog) = common::setup_storage_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
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
}

#[tokio::test]
async fn test_put_upserts_under_derived_key() {
    let (server, catalog) = common::setup_storage_mock().await;

    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/{}/u1/docs/a.pdf", common::BUCKET)))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "application/pdf"))
        .and(body_bytes(b"%PDF-1.7".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Key": format!("{}/u1/docs/a.pdf", common::BUCKET)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.pdf");
    std::fs::write(&src, b"%PDF-1.7").unwrap();

    let request = UploadRequest::new(OwnerId::new("u1").unwrap(), "docs", "a.pdf")
        .with_content_type("application/pdf");
    let remote = catalog.put(&src, &request).await.expect("upload should succeed");
    assert_eq!(remote.as_str(), "u1/docs/a.pdf");
}

#[tokio::test]
async fn test_put_rejected_by_server() {
    let (server, catalog) = common::setup_storage_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("big.bin");
    std::fs::write(&src, b"x").unwrap();

    let request = UploadRequest::new(OwnerId::new("u1").unwrap(), "docs", "big.bin");
    let err = catalog.put(&src, &request).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::Status { status: 413, .. })
    ));
}

#[tokio::test]
async fn test_delete_existing_and_missing() {
    let (server, catalog) = common::setup_storage_mock().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/storage/v1/object/{}/u1/news/a.mp4", common::BUCKET)))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/storage/v1/object/{}/u1/news/b.mp4", common::BUCKET)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(catalog
        .delete(&RemotePath::new("u1/news/a.mp4").unwrap())
        .await
        .unwrap());
    assert!(!catalog
        .delete(&RemotePath::new("u1/news/b.mp4").unwrap())
        .await
        .unwrap());
}
