use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use bucket_service::{
    BucketService, MemoryStorageClient,
    handlers::AppState,
    models::acl::{GroupGrantee, Permission},
    routes,
};
use std::sync::Arc;
use tower::ServiceExt;

const BUCKET: &str = "media";

fn memory_service() -> (Arc<MemoryStorageClient>, BucketService) {
    let client = Arc::new(MemoryStorageClient::new().with_bucket(BUCKET));
    let service = BucketService::new(client.clone(), BUCKET);
    (client, service)
}

#[tokio::test]
async fn upload_then_download_is_byte_identical() {
    let (_, service) = memory_service();
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();

    let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    let local = src.path().join("upload.bin");
    std::fs::write(&local, &content).unwrap();

    service
        .upload_service()
        .upload_file(&local, "archive/2025/data.bin")
        .await
        .unwrap();
    let downloaded = service
        .download_service()
        .download_file_to("archive/2025/data.bin", &dst.path().join("restore"))
        .await
        .unwrap();

    assert_eq!(downloaded, dst.path().join("restore").join("data.bin"));
    assert_eq!(std::fs::read(&downloaded).unwrap(), content);
}

#[tokio::test]
async fn public_upload_stores_all_users_read_grant() {
    let (client, service) = memory_service();
    let src = tempfile::tempdir().unwrap();
    let local = src.path().join("logo.png");
    std::fs::write(&local, b"png").unwrap();

    service
        .upload_service()
        .upload_public_file(&local, "public/logo.png")
        .await
        .unwrap();
    service
        .upload_service()
        .upload_file(&local, "private/logo.png")
        .await
        .unwrap();

    let acl = client.object_acl(BUCKET, "public/logo.png").unwrap();
    assert!(acl.has_grant(&GroupGrantee::AllUsers.into(), Permission::Read));
    assert!(client.object_acl(BUCKET, "private/logo.png").is_none());
}

#[tokio::test]
async fn listings_separate_files_from_directories() {
    let (client, service) = memory_service();
    for key in ["docs/", "docs/a.txt", "docs/b.txt", "docs/2024/old.txt", "docs/drafts/x.txt"] {
        client.insert_object(BUCKET, key, "x").unwrap();
    }
    let info = service.information_service();

    assert_eq!(
        info.list_file_names("docs/").await.unwrap(),
        ["docs/a.txt", "docs/b.txt"]
    );
    assert_eq!(
        info.list_directories("docs/").await.unwrap(),
        ["docs/2024/", "docs/drafts/"]
    );
    let files = info.list_files("docs/").await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].bucket_name(), BUCKET);
    assert_eq!(files[0].size(), 1);

    assert!(info.file_exists("docs/a.txt").await.unwrap());
    // Prefix semantics: a "directory" counts as existing.
    assert!(info.file_exists("docs/dra").await.unwrap());
    assert!(!info.file_exists("images/").await.unwrap());
}

#[tokio::test]
async fn move_leaves_only_destination() {
    let (client, service) = memory_service();
    client.insert_object(BUCKET, "inbox/a.txt", "hello").unwrap();

    service
        .modification_service()
        .move_file("inbox/a.txt", "archive/a.txt")
        .await
        .unwrap();

    assert_eq!(client.keys(BUCKET), ["archive/a.txt"]);
    assert_eq!(client.object_body(BUCKET, "archive/a.txt").unwrap(), "hello");
}

#[tokio::test]
async fn move_onto_same_key_keeps_the_object() {
    let (client, service) = memory_service();
    client.insert_object(BUCKET, "inbox/a.txt", "hello").unwrap();

    let err = service
        .modification_service()
        .move_file("inbox/a.txt", "inbox/a.txt")
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(client.keys(BUCKET), ["inbox/a.txt"]);
    assert_eq!(client.object_body(BUCKET, "inbox/a.txt").unwrap(), "hello");
}

#[tokio::test]
async fn downloading_missing_key_is_not_found() {
    let (_, service) = memory_service();
    let dst = tempfile::tempdir().unwrap();

    let err = service
        .download_service()
        .download_file_to("missing.txt", dst.path())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

fn app(service: BucketService, dir: &std::path::Path) -> Router {
    routes::routes::routes().with_state(AppState::new(service, dir))
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn http_round_trip() {
    let (client, service) = memory_service();
    let dir = tempfile::tempdir().unwrap();
    let app = app(service, dir.path());

    let (status, _) = send(&app, Method::PUT, "/files/docs/readme.md", Body::from("# hi")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(client.object_body(BUCKET, "docs/readme.md").unwrap(), "# hi");

    let (status, body) = send(&app, Method::GET, "/files/docs/readme.md", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# hi");

    let (status, _) = send(&app, Method::HEAD, "/files/docs/readme.md", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/list?path=docs/&kind=names", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(names, ["docs/readme.md"]);

    let move_req = Request::builder()
        .method(Method::POST)
        .uri("/move")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"source":"docs/readme.md","destination":"docs/README.md"}"#,
        ))
        .unwrap();
    let response = app.clone().oneshot(move_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(client.keys(BUCKET), ["docs/README.md"]);

    let (status, body) = send(&app, Method::GET, "/presign/docs/README.md?minutes=5", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let presign: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(presign["expires_in_minutes"], 5);
    assert!(presign["url"].as_str().unwrap().starts_with("memory://media/"));

    let (status, _) = send(&app, Method::DELETE, "/files/docs/README.md", Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/files/docs/README.md", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["status"], 404);

    let (status, _) = send(&app, Method::HEAD, "/files/docs/README.md", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rejects_directory_download() {
    let (client, service) = memory_service();
    client.insert_object(BUCKET, "docs/", "").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let app = app(service, dir.path());

    let (status, _) = send(&app, Method::GET, "/files/docs/", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_downloads_leave_no_staging_behind() {
    let (_, service) = memory_service();
    let dir = tempfile::tempdir().unwrap();
    let app = app(service, dir.path());

    let (status, _) = send(&app, Method::GET, "/files/missing.txt", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/files/docs/", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn readiness_reports_bucket_and_disk() {
    let (_, service) = memory_service();
    let dir = tempfile::tempdir().unwrap();
    let app = app(service, dir.path());

    let (status, body) = send(&app, Method::GET, "/readyz", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let ready: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ready["checks"]["bucket"]["ok"], true);
    assert_eq!(ready["checks"]["disk"]["ok"], true);

    let missing = BucketService::new(Arc::new(MemoryStorageClient::new()), "absent");
    let app = routes::routes::routes().with_state(AppState::new(missing, dir.path()));
    let (status, _) = send(&app, Method::GET, "/readyz", Body::empty()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
