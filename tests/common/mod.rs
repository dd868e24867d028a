#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use car_doctor_api::auth::{Identity, TokenService};
use car_doctor_api::config::CollectionNames;
use car_doctor_api::database::{Document, MemoryDocumentStore};
use car_doctor_api::{router, AppState};

pub const SECRET: &str = "integration-test-secret";

/// Router wired to an in-memory store the test can inspect
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryDocumentStore>,
    pub tokens: TokenService,
    pub collections: CollectionNames,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryDocumentStore::new());
    let tokens = TokenService::new(SECRET, Duration::hours(1));
    let state = AppState {
        store: store.clone(),
        tokens: tokens.clone(),
        collections: CollectionNames::default(),
        cookie_secure: false,
    };

    TestApp {
        collections: state.collections.clone(),
        router: router(state),
        store,
        tokens,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body")
            .to_vec();

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// `Cookie` header value carrying a fresh token for `email`
    pub fn cookie_for(&self, email: &str) -> String {
        let token = self.tokens.issue(&Identity::new(email)).unwrap();
        format!("token={}", token)
    }

    pub async fn seed(&self, collection: &str, docs: Vec<Value>) -> Vec<uuid::Uuid> {
        let docs: Vec<Document> = docs
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("seed documents must be objects"),
            })
            .collect();
        self.store.seed(collection, docs).await
    }
}

/// The server binary, started on a free port with the memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_car-doctor-api"))
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("ACCESS_TOKEN_SECRET", SECRET)
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(StdDuration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: StdDuration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(StdDuration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Token issued `age` ago, for expiry checks
pub fn aged_cookie(tokens: &TokenService, email: &str, age: Duration) -> String {
    let token = tokens.issue_at(&Identity::new(email), Utc::now() - age).unwrap();
    format!("token={}", token)
}
