use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use formdrop::config::Config;
use formdrop::db::Database;
use formdrop::services::UserService;
use formdrop::storage::LocalBlobStore;
use formdrop::{create_router, AppState};

const BOUNDARY: &str = "formdrop-test-boundary";

struct TestApp {
    state: AppState,
    uploads: PathBuf,
}

async fn test_app() -> TestApp {
    let base = std::env::temp_dir().join(format!("formdrop_test_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&base).unwrap();

    let db = Database::new(base.join("test.db").to_str().unwrap())
        .await
        .unwrap();
    db.run_migrations().await.unwrap();

    let uploads = base.join("uploads");
    let state = AppState {
        db: Some(db),
        config: Arc::new(Config::default()),
        storage: Arc::new(LocalBlobStore::new(&uploads)),
    };

    TestApp { state, uploads }
}

fn push_text(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
    );
}

fn push_file(buf: &mut Vec<u8>, name: &str, filename: &str, content_type: &str, data: &[u8]) {
    buf.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

fn finish(mut buf: Vec<u8>) -> Vec<u8> {
    buf.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    buf
}

fn text_fields() -> Vec<u8> {
    let mut buf = Vec::new();
    push_text(&mut buf, "name", "Alice");
    push_text(&mut buf, "email", "a@x.com");
    push_text(&mut buf, "phone", "555");
    push_text(&mut buf, "city", "NYC");
    buf
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn uploads_entries(dir: &PathBuf) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn api_create_user_persists_record_and_files() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    let image_bytes = vec![0x89u8; 10 * 1024];
    let pdf_bytes = vec![0x25u8; 20 * 1024];

    let mut body = text_fields();
    push_file(&mut body, "image", "photo.png", "image/png", &image_bytes);
    push_file(&mut body, "pdf", "doc.pdf", "application/pdf", &pdf_bytes);

    let res = router
        .oneshot(multipart_request("/api/users", finish(body)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(res).await,
        json!({"status": "success", "message": "User created"})
    );

    let db = app.state.db.as_ref().unwrap();
    assert_eq!(UserService::count(db).await.unwrap(), 1);

    let record = UserService::find(db, 1).await.unwrap().unwrap();
    assert_eq!(record.name, "Alice");
    assert_eq!(record.email, "a@x.com");
    assert_eq!(record.phone, "555");
    assert_eq!(record.city, "NYC");
    assert!(!record.image_path.is_empty());
    assert!(!record.pdf_path.is_empty());

    // Stored bytes match the upload, under generated keys
    assert_eq!(std::fs::read(&record.image_path).unwrap(), image_bytes);
    assert_eq!(std::fs::read(&record.pdf_path).unwrap(), pdf_bytes);
    assert!(!record.image_path.contains("photo"));
}

#[tokio::test]
async fn api_missing_pdf_is_400_with_no_record() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    let mut body = text_fields();
    push_file(&mut body, "image", "photo.png", "image/png", b"imagedata");

    let res = router
        .oneshot(multipart_request("/api/users", finish(body)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("pdf"));

    let db = app.state.db.as_ref().unwrap();
    assert_eq!(UserService::count(db).await.unwrap(), 0);

    // The image written before the pdf check may stay behind (orphan)
    assert_eq!(uploads_entries(&app.uploads).len(), 1);
}

#[tokio::test]
async fn api_missing_image_is_400() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    let mut body = text_fields();
    push_file(&mut body, "pdf", "doc.pdf", "application/pdf", b"pdfdata");

    let res = router
        .oneshot(multipart_request("/api/users", finish(body)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("image"));

    let db = app.state.db.as_ref().unwrap();
    assert_eq!(UserService::count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn api_rejects_non_post() {
    let app = test_app().await;
    let router = create_router(app.state);

    let res = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn api_without_database_is_503() {
    let mut app = test_app().await;
    app.state.db = None;
    let router = create_router(app.state);

    let mut body = text_fields();
    push_file(&mut body, "image", "photo.png", "image/png", b"imagedata");
    push_file(&mut body, "pdf", "doc.pdf", "application/pdf", b"pdfdata");

    let res = router
        .oneshot(multipart_request("/api/users", finish(body)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn form_submit_without_files_creates_record_with_empty_paths() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    let res = router
        .oneshot(multipart_request("/submit", finish(text_fields())))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);

    let db = app.state.db.as_ref().unwrap();
    let record = UserService::find(db, 1).await.unwrap().unwrap();
    assert_eq!(record.name, "Alice");
    assert_eq!(record.image_path, "");
    assert_eq!(record.pdf_path, "");
}

#[tokio::test]
async fn form_submit_without_database_still_saves_files() {
    let mut app = test_app().await;
    app.state.db = None;
    let router = create_router(app.state);

    let image_bytes = b"imagedata".to_vec();
    let mut body = text_fields();
    push_file(&mut body, "image", "photo.png", "image/png", &image_bytes);

    let res = router
        .oneshot(multipart_request("/submit", finish(body)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(text_body(res).await.contains("database"));

    let entries = uploads_entries(&app.uploads);
    assert_eq!(entries.len(), 1);
    assert_eq!(std::fs::read(&entries[0]).unwrap(), image_bytes);
}

#[tokio::test]
async fn oversized_request_is_rejected_before_any_write() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    let mut body = text_fields();
    push_file(&mut body, "image", "photo.png", "image/png", b"imagedata");

    let res = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/submit")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::CONTENT_LENGTH, (50 * 1024 * 1024 + 1).to_string())
                .body(Body::from(finish(body)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let db = app.state.db.as_ref().unwrap();
    assert_eq!(UserService::count(db).await.unwrap(), 0);
    assert!(uploads_entries(&app.uploads).is_empty());
}

#[tokio::test]
async fn duplicate_submissions_create_two_records() {
    let app = test_app().await;
    let router = create_router(app.state.clone());

    for _ in 0..2 {
        let mut body = text_fields();
        push_file(&mut body, "image", "photo.png", "image/png", b"imagedata");
        push_file(&mut body, "pdf", "doc.pdf", "application/pdf", b"pdfdata");

        let res = router
            .clone()
            .oneshot(multipart_request("/api/users", finish(body)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let db = app.state.db.as_ref().unwrap();
    assert_eq!(UserService::count(db).await.unwrap(), 2);

    // No dedup: two distinct rows, two distinct stored files per part
    let first = UserService::find(db, 1).await.unwrap().unwrap();
    let second = UserService::find(db, 2).await.unwrap().unwrap();
    assert_ne!(first.image_path, second.image_path);
}

#[tokio::test]
async fn form_page_is_served() {
    let app = test_app().await;
    let router = create_router(app.state);

    let res = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(text_body(res).await.contains("multipart/form-data"));
}
