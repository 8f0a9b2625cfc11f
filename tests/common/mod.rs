//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use is_agent::transport::TransportError;
use is_agent::{ClassificationResult, ClientConfig, Error, IsAgentClient, Transport};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const ENDPOINT: &str = "/is_agent";

/// Test fixture that manages a mock classification endpoint
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client pointed at the mock server
    pub fn client(&self) -> IsAgentClient {
        IsAgentClient::builder()
            .config(ClientConfig::new().with_base_url(&self.base_url))
            .build()
            .expect("client builds")
    }

    /// Successful classification for `token`, expected exactly `hits` times
    pub async fn mock_success(&mut self, token: &str, body: serde_json::Value, hits: usize) -> Mock {
        self.server
            .mock("POST", ENDPOINT)
            .match_body(Matcher::Json(serde_json::json!({ "public_token": token })))
            .match_header("x-isagent-request-id", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// Error response with an arbitrary body
    pub async fn mock_error(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", ENDPOINT)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

/// Transport whose calls block until released, with scripted responses.
pub struct GateTransport {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<is_agent::Result<ClassificationResult>>>,
    gate: Semaphore,
}

impl GateTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(VecDeque::new()),
            gate: Semaphore::new(0),
        })
    }

    pub fn push(&self, response: is_agent::Result<ClassificationResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for GateTransport {
    async fn classify(&self, _public_token: &str) -> is_agent::Result<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?
            .forget();
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport(TransportError::Other("aborted".into()))))
    }

    fn name(&self) -> &'static str {
        "gate"
    }
}

/// Yield until `cond` holds, failing the test after five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
