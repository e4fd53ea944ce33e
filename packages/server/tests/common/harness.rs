//! Router-level test harness.
//!
//! Builds the full application router over an in-memory job store, HS256
//! test tokens and the fakes in `fakes.rs`. Requests go through
//! `tower::ServiceExt::oneshot`, so no socket is opened.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use harvester::MemoryJobStore;
use serde_json::Value;
use server_core::domains::auth::{HsVerifier, ADMIN_GROUP, DEFAULT_GROUP};
use server_core::server::{build_app, AppState};
use tower::ServiceExt;

use super::{FakeIdentity, RecordingTrigger};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_ISSUER: &str = "https://cognito-idp.eu-central-1.amazonaws.com/pool-test";
pub const TEST_CLIENT_ID: &str = "client-test";

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestHarness {
    pub store: Arc<MemoryJobStore>,
    pub identity: Arc<FakeIdentity>,
    pub scraper: Arc<RecordingTrigger>,
    pub tokens: HsVerifier,
    app: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Arc::new(MemoryJobStore::new());
        let identity = Arc::new(FakeIdentity::new());
        let scraper = Arc::new(RecordingTrigger::default());
        let tokens = HsVerifier::new(TEST_SECRET, TEST_ISSUER, TEST_CLIENT_ID);

        let state = AppState {
            store: store.clone(),
            identity: identity.clone(),
            verifier: Arc::new(tokens.clone()),
            scraper: scraper.clone(),
        };
        let app = build_app(state, &[]);

        Self {
            store,
            identity,
            scraper,
            tokens,
            app,
        }
    }

    pub fn token_for(&self, email: &str, groups: &[&str]) -> String {
        self.tokens
            .issue_token(&format!("sub-{}", email), email, groups)
            .expect("issue test token")
    }

    pub fn user_token(&self, email: &str) -> String {
        self.token_for(email, &[DEFAULT_GROUP])
    }

    pub fn admin_token(&self) -> String {
        self.token_for("admin@example.com", &[DEFAULT_GROUP, ADMIN_GROUP])
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}
