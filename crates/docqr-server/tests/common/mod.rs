//! Test application wired to the in-memory driver

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use docqr_connection::{ConnectionManager, RetryPolicy};
use docqr_driver_memory::MemoryDriver;
use docqr_server::{
    AppState, ServerConfig,
    cli::GlobalOptions,
    config::FileConfig,
    router,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const DATABASE_URI: &str = "memory://library";
pub const BOUNDARY: &str = "docqr-test-boundary";

pub struct TestApp {
    pub driver: Arc<MemoryDriver>,
    pub manager: Arc<ConnectionManager>,
    pub state: Arc<AppState>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn connected() -> Self {
        Self::build(None, true).await
    }

    pub async fn disconnected() -> Self {
        Self::build(None, false).await
    }

    pub async fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(Some(max_upload_bytes), true).await
    }

    async fn build(max_upload_bytes: Option<usize>, connect: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let options = GlobalOptions {
            database_uri: Some(DATABASE_URI.to_string()),
            upload_dir: Some(dir.path().join("pdfs")),
            max_upload_bytes,
            ..GlobalOptions::default()
        };
        let config = ServerConfig::resolve(&options, FileConfig::default(), &|_: &str| None).unwrap();

        let driver = Arc::new(MemoryDriver::new());
        let manager = Arc::new(ConnectionManager::new(driver.clone()));
        if connect {
            manager
                .connect(DATABASE_URI, &RetryPolicy::new(1, Duration::ZERO))
                .await
                .unwrap();
        }

        let state = AppState::new(manager.clone(), &config);
        Self {
            driver,
            manager,
            state,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Wait until the manager's watcher has applied pending events
    pub async fn wait_until_not_live(&self) {
        for _ in 0..100 {
            if !self.manager.is_live() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("connection still live");
    }
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n".to_vec()
}

/// Multipart body with one file field
pub fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>, accept_json: bool) -> Request<Body> {
    let mut builder = Request::post("/api/pdf/upload")
        .header("host", "docs.test")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if accept_json {
        builder = builder.header("accept", "application/json");
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
