//! Server test utilities.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use folio_core::config::AppConfig;
use folio_server::{AppState, create_router};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server over a temporary uploads directory.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    temp_dir: TempDir,
}

/// A buffered response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with default configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let uploads = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).expect("Failed to create uploads directory");

        let mut config = AppConfig::for_testing(&uploads);
        modifier(&mut config);

        let state = AppState::from_config(config).expect("Failed to build state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    pub fn uploads(&self) -> &Path {
        &self.state.config.uploads.root
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file into the uploads directory.
    pub fn put_upload(&self, name: &str, data: &[u8]) {
        std::fs::write(self.uploads().join(name), data).expect("Failed to write upload");
    }

    /// Send a GET request, optionally as a subject with roles.
    pub async fn get(&self, uri: &str, subject: Option<u64>, roles: &[&str]) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(id) = subject {
            builder = builder.header("x-folio-subject", id.to_string());
        }
        if !roles.is_empty() {
            builder = builder.header("x-folio-roles", roles.join(","));
        }

        let request = builder.body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
