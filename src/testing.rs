//! Scripted transport for unit tests.

use crate::transport::{Transport, TransportError};
use crate::types::ClassificationResult;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Replays queued responses. Each call first waits for a permit on the gate, so tests
/// decide exactly when an in-flight call completes.
pub(crate) struct GatedTransport {
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<ClassificationResult>>>,
    gate: Semaphore,
}

impl GatedTransport {
    /// Calls block until [`release`](Self::release) is called.
    pub fn new() -> Self {
        Self::with_permits(0)
    }

    /// Calls complete as soon as they are made.
    pub fn open() -> Self {
        Self::with_permits(Semaphore::MAX_PERMITS)
    }

    fn with_permits(permits: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: Semaphore::new(permits),
        }
    }

    pub fn push(&self, response: Result<ClassificationResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn classify(&self, public_token: &str) -> Result<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(public_token.to_string());
        let permit = self.gate.acquire().await.map_err(|_| {
            Error::runtime_with_context("gate closed", ErrorContext::new().with_source("test"))
        })?;
        permit.forget();
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(Error::Transport(TransportError::Other(
                "no scripted response".into(),
            )))
        })
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Yield to the runtime until `cond` holds; panics after five seconds.
pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
