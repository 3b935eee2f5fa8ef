#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vitrine_gateway::auth::{AdminCredentials, JwtSessionAuth, SessionAuth};
use vitrine_gateway::handlers::{self, AppState, ResourceConfig};
use vitrine_gateway::upstream::{ContentService, UpstreamError};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_ADMIN_EMAIL: &str = "admin@test.local";
pub const TEST_ADMIN_PASSWORD: &str = "test-password";

/// Per-verb call counters plus the last list invocation, for asserting that
/// handlers do (or do not) reach the upstream.
#[derive(Default)]
pub struct CallLog {
    pub list: AtomicUsize,
    pub get: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub last_list: Mutex<Option<(String, HashMap<String, String>)>>,
}

impl CallLog {
    pub fn list_calls(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }
    pub fn get_calls(&self) -> usize {
        self.get.load(Ordering::SeqCst)
    }
    pub fn create_calls(&self) -> usize {
        self.create.load(Ordering::SeqCst)
    }
    pub fn update_calls(&self) -> usize {
        self.update.load(Ordering::SeqCst)
    }
    pub fn delete_calls(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }
}

/// Canned upstream: fixed payloads, call counting, optional delete failure
/// after the first call (to model deleting an already-deleted item).
pub struct MockContent {
    pub calls: CallLog,
    pub collection: Value,
    pub item: Value,
    pub fail_delete_after_first: bool,
}

impl Default for MockContent {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            collection: json!([
                { "id": 1, "name": "Balanza de precisión", "category": "balances" },
                { "id": 2, "name": "Balanza industrial", "category": "balances" },
            ]),
            item: json!({ "id": 42, "name": "Balanza de precisión", "category": "balances" }),
            fail_delete_after_first: false,
        }
    }
}

#[async_trait]
impl ContentService for MockContent {
    async fn list(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_list.lock().unwrap() = Some((endpoint.to_string(), params.clone()));
        Ok(self.collection.clone())
    }

    async fn get(
        &self,
        _endpoint: &str,
        _id: &str,
        _params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        Ok(self.item.clone())
    }

    async fn create(&self, _endpoint: &str, _body: &Value) -> Result<Value, UpstreamError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        Ok(self.item.clone())
    }

    async fn update(
        &self,
        _endpoint: &str,
        _id: &str,
        _body: &Value,
    ) -> Result<Value, UpstreamError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        Ok(self.item.clone())
    }

    async fn delete(&self, endpoint: &str, _id: &str) -> Result<(), UpstreamError> {
        let call = self.calls.delete.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_after_first && call >= 1 {
            return Err(UpstreamError::Status {
                status: 404,
                endpoint: endpoint.to_string(),
            });
        }
        Ok(())
    }
}

pub fn state_with(upstream: Arc<MockContent>) -> AppState {
    AppState {
        auth: Arc::new(JwtSessionAuth::new(TEST_SECRET, 1)),
        upstream,
        credentials: AdminCredentials::new(TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD),
    }
}

/// A valid session token for the test auth secret.
pub fn session_token() -> String {
    JwtSessionAuth::new(TEST_SECRET, 1)
        .issue_token(uuid::Uuid::new_v4(), "admin@test.local")
        .expect("token issuance")
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Serve the app on an ephemeral port for client-layer tests; returns the
/// base URL.
pub async fn spawn_app(
    state: AppState,
    resources: Vec<ResourceConfig>,
) -> anyhow::Result<String> {
    let app = handlers::app(state, resources);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}", addr))
}
