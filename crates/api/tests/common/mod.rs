//! Shared test harness: builds the real application router (same
//! middleware stack as production) over a per-test database pool and a
//! throwaway storage root, plus request/response helpers.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of the helpers.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use flightbay_api::config::ServerConfig;
use flightbay_api::probe::StatusProbe;
use flightbay_api::router::build_app_router;
use flightbay_api::state::AppState;
use flightbay_api::storage::UploadStorage;

/// Identity headers installed by the (external) auth layer.
pub const UPLOADER_ID: i64 = 1;
pub const FLEET_ID: i64 = 1;

/// Small chunk size so multi-chunk fixtures stay tiny.
pub const TEST_CHUNK_SIZE: u64 = 64;

/// The application under test plus the handles tests poke directly.
pub struct TestApp {
    pub router: Router,
    pub storage: Arc<UploadStorage>,
    pub pool: PgPool,
    _storage_guard: tempfile::TempDir,
}

/// Build a test `ServerConfig` with safe defaults and the given service
/// probe list.
pub fn test_config(
    staging_dir: &str,
    archive_dir: &str,
    status_services: Vec<(String, Option<String>)>,
) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        chunk_size_bytes: TEST_CHUNK_SIZE,
        staging_dir: staging_dir.to_string(),
        archive_dir: archive_dir.to_string(),
        status_services,
        probe_timeout_secs: 2,
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool and a temp-dir storage root.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with_services(pool, Vec::new())
}

pub fn build_test_app_with_services(
    pool: PgPool,
    status_services: Vec<(String, Option<String>)>,
) -> TestApp {
    let storage_guard = tempfile::tempdir().expect("temp storage root");
    let staging = storage_guard.path().join("staging");
    let archive = storage_guard.path().join("archive");

    let config = test_config(
        staging.to_str().expect("staging path"),
        archive.to_str().expect("archive path"),
        status_services,
    );

    let storage = Arc::new(UploadStorage::new(&config.staging_dir, &config.archive_dir));
    let probe = Arc::new(StatusProbe::new(
        config.status_services.clone(),
        Duration::from_secs(config.probe_timeout_secs),
    ));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        storage: Arc::clone(&storage),
        probe,
    };

    TestApp {
        router: build_app_router(state, &config),
        storage,
        pool,
        _storage_guard: storage_guard,
    }
}

// ── Request helpers ──────────────────────────────────────────────────

/// Issue a request with the standard uploader identity headers.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<String>,
) -> Response<Body> {
    send_as(app, method, uri, body, content_type, UPLOADER_ID, FLEET_ID).await
}

/// Issue a request as a specific uploader.
pub async fn send_as(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<String>,
    uploader_id: i64,
    fleet_id: i64,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-uploader-id", uploader_id)
        .header("x-fleet-id", fleet_id);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let request = builder.body(body).expect("request");
    app.oneshot(request).await.expect("response")
}

/// GET with identity headers.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
}

// ── Multipart helpers ────────────────────────────────────────────────

const BOUNDARY: &str = "flightbay-test-boundary";

/// Encode text fields as a multipart/form-data body.
pub fn multipart_form(fields: &[(&str, &str)]) -> (Body, String) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    (
        Body::from(body),
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

/// Encode raw chunk bytes as the single-part body of a chunk PUT.
pub fn multipart_chunk(bytes: &[u8]) -> (Body, String) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"chunk\"; \
             filename=\"chunk\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (
        Body::from(body),
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

// ── Protocol helpers ─────────────────────────────────────────────────

/// POST a NEW_UPLOAD request for `content` under `filename`, returning
/// the response.
pub async fn post_new_upload(app: Router, filename: &str, content: &[u8]) -> Response<Body> {
    let md5 = format!("{:x}", md5::compute(content));
    post_new_upload_with_hash(app, filename, content, &md5).await
}

/// POST a NEW_UPLOAD request announcing an explicit hash.
pub async fn post_new_upload_with_hash(
    app: Router,
    filename: &str,
    content: &[u8],
    md5: &str,
) -> Response<Body> {
    let size = content.len() as u64;
    let number_chunks = size.div_ceil(TEST_CHUNK_SIZE);
    let identifier = format!("{size}-{filename}");
    let (body, content_type) = multipart_form(&[
        ("request", "NEW_UPLOAD"),
        ("filename", filename),
        ("identifier", &identifier),
        ("numberChunks", &number_chunks.to_string()),
        ("sizeBytes", &size.to_string()),
        ("md5Hash", md5),
    ]);
    send(app, Method::POST, "/upload", body, Some(content_type)).await
}

/// PUT one chunk of `content` by index.
pub async fn put_chunk(
    app: Router,
    upload_id: i64,
    chunk_index: u64,
    content: &[u8],
) -> Response<Body> {
    let start = (chunk_index * TEST_CHUNK_SIZE) as usize;
    let end = (start + TEST_CHUNK_SIZE as usize).min(content.len());
    let (body, content_type) = multipart_chunk(&content[start..end]);
    send(
        app,
        Method::PUT,
        &format!("/upload/{upload_id}/chunk/{chunk_index}"),
        body,
        Some(content_type),
    )
    .await
}

/// Upload every chunk of `content` in order; returns the final response.
pub async fn put_all_chunks(app: Router, upload_id: i64, content: &[u8]) -> Response<Body> {
    let number_chunks = (content.len() as u64).div_ceil(TEST_CHUNK_SIZE);
    let mut last = None;
    for index in 0..number_chunks {
        last = Some(put_chunk(app.clone(), upload_id, index, content).await);
        if index + 1 < number_chunks {
            let response = last.take().expect("chunk response");
            assert_eq!(response.status(), StatusCode::OK, "mid-sequence chunk PUT");
        }
    }
    last.expect("at least one chunk")
}
