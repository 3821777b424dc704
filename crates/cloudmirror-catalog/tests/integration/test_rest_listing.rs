//! Listing the owner's files through the storage list endpoint

use cloudmirror_core::domain::OwnerId;
use cloudmirror_core::ports::IRemoteCatalog;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, folder, object};

#[tokio::test]
async fn test_list_walks_collections() {
    let (server, catalog) = common::setup_storage_mock().await;

    common::mount_folder(
        &server,
        "u1/",
        serde_json::json!([folder("news"), folder("docs")]),
    )
    .await;
    common::mount_folder(
        &server,
        "u1/news/",
        serde_json::json!([object("a.mp4", 2048, "video/mp4"), object("b.jpg", 10, "image/jpeg")]),
    )
    .await;
    common::mount_folder(
        &server,
        "u1/docs/",
        serde_json::json!([object("report.pdf", 77, "application/pdf")]),
    )
    .await;

    let owner = OwnerId::new("u1").unwrap();
    let mut files = catalog.list(&owner).await.expect("list should succeed");
    files.sort_by(|a, b| a.remote_path.cmp(&b.remote_path));

    let keys: Vec<&str> = files.iter().map(|f| f.remote_path.as_str()).collect();
    assert_eq!(keys, vec!["u1/docs/report.pdf", "u1/news/a.mp4", "u1/news/b.jpg"]);

    let clip = &files[1];
    assert_eq!(clip.owner_id, owner);
    assert_eq!(clip.collection_name, "news");
    assert_eq!(clip.size, 2048);
    assert_eq!(clip.content_type, "video/mp4");
    assert_eq!(clip.uploaded_at.to_rfc3339(), "2026-03-01T09:00:00+00:00");
}

#[tokio::test]
async fn test_list_sends_bearer_token() {
    let (server, catalog) = common::setup_storage_mock().await;

    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/list/{}", common::BUCKET)))
        .and(header("authorization", format!("Bearer {}", common::API_KEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let files = catalog.list(&OwnerId::new("u1").unwrap()).await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_list_failure_is_an_error() {
    let (server, catalog) = common::setup_storage_mock().await;

    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/object/list/{}", common::BUCKET)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(catalog.list(&OwnerId::new("u1").unwrap()).await.is_err());
}
