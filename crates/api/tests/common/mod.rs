//! Shared helpers for router-level integration tests.
//!
//! Every test app gets its own temp directory holding a stub engine script
//! and the scratch directory, so tests can run in parallel and inspect
//! leftover job files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use recombyne_api::config::{EngineConfig, ServerConfig};
use recombyne_api::router::build_app_router;
use recombyne_api::state::AppState;

/// Engine that copies the input sequence into a successful result document.
pub const ECHO_ENGINE: &str = r#"seq=$(sed -n 's/.*"sequence":"\([^"]*\)".*/\1/p' "$1")
printf '{"success":true,"optimized_sequence":"%s","constraints_summary":"","objectives_summary":""}' "$seq" > "$2"
"#;

/// A running application under test.
pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    root: TempDir,
}

impl TestApp {
    /// Directory holding this app's job files.
    pub fn scratch_dir(&self) -> &Path {
        &self.config.engine.scratch_dir
    }

    /// Path inside this app's private temp directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Job files currently present in the scratch directory.
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.scratch_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn post_json(&self, uri: &str, body: &serde_json::Value) -> Response<Body> {
        post_json(self.router.clone(), uri, body).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        get(self.router.clone(), uri).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Build a test `ServerConfig` rooted at `root`, running `engine_script`
/// through `sh`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(root: &Path, engine_script: &str) -> ServerConfig {
    let script_path = root.join("engine.sh");
    std::fs::write(&script_path, engine_script).unwrap();

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        body_limit_bytes: 10 * 1024 * 1024,
        engine: EngineConfig {
            script_path,
            interpreter: Some("sh".to_string()),
            timeout_secs: 10,
            scratch_dir: root.join("scratch"),
        },
    }
}

/// Build the full application router around a stub engine.
pub fn spawn_app(engine_script: &str) -> TestApp {
    spawn_app_with(engine_script, |_| {})
}

/// Like [`spawn_app`], letting the caller adjust the configuration first.
pub fn spawn_app_with(engine_script: &str, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path(), engine_script);
    configure(&mut config);

    let state = AppState::new(config.clone());
    let router = build_app_router(state, &config);

    TestApp {
        router,
        config,
        root,
    }
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
