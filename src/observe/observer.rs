//! Lifecycle-scoped observation of a shared classification.

use super::state::AgentState;
use crate::cache::{ClassificationCache, ClassifyOptions};
use crate::{Error, ErrorContext};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One observer of the classification for a token.
///
/// Starts in [`AgentState::Success`] when the cache already holds a result, otherwise in
/// [`AgentState::Loading`]. The first [`activate`](Self::activate) while loading starts
/// (or joins) the shared request; later calls do nothing. Dropping the observer cancels
/// its wait and any completion arriving afterwards is discarded.
pub struct Observer {
    cache: Arc<ClassificationCache>,
    token: Arc<str>,
    state: watch::Receiver<AgentState>,
    // Present until the request is triggered.
    pending: Option<watch::Sender<AgentState>>,
    signal: CancellationToken,
}

impl Observer {
    pub(crate) fn new(cache: Arc<ClassificationCache>, token: Arc<str>) -> Self {
        let initial = match cache.peek_cached(&token) {
            Some(result) => AgentState::Success(result),
            None => AgentState::Loading,
        };
        let (sender, state) = watch::channel(initial);
        Self {
            cache,
            token,
            state,
            pending: Some(sender),
            signal: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> AgentState {
        self.state.borrow().clone()
    }

    /// Whether this observer has started its request.
    pub fn is_triggered(&self) -> bool {
        self.pending.is_none()
    }

    /// Trigger the request if this observer is loading and has not triggered yet.
    ///
    /// Outside a Tokio runtime the observer moves to the error phase instead.
    pub fn activate(&mut self) {
        if !self.state.borrow().is_loading() {
            return;
        }
        let Some(sender) = self.pending.take() else {
            return;
        };

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                sender.send_replace(AgentState::Error(Error::runtime_with_context(
                    format!("no async runtime to run classification: {}", e),
                    ErrorContext::new().with_source("observer"),
                )));
                return;
            }
        };

        let cache = Arc::clone(&self.cache);
        let token = Arc::clone(&self.token);
        let signal = self.signal.clone();
        runtime.spawn(async move {
            let options = ClassifyOptions::new().with_signal(signal.clone());
            let outcome = cache.classify(&token, options).await;
            if signal.is_cancelled() {
                debug!("observer dropped before classification settled; discarding");
                return;
            }
            let next = match outcome {
                Ok(result) => AgentState::Success(result),
                Err(e) => AgentState::Error(e),
            };
            // Only fails when the observer is gone.
            let _ = sender.send(next);
        });
    }

    /// Activate and wait until the state is no longer loading.
    pub async fn settled(&mut self) -> AgentState {
        self.activate();
        let settled = match self.state.wait_for(|s| !s.is_loading()).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.state())
    }

    /// Activate and wait for the next transition. `None` when no transition can follow.
    pub async fn changed(&mut self) -> Option<AgentState> {
        self.activate();
        if !self.is_triggered() {
            return None;
        }
        self.state.changed().await.ok()?;
        Some(self.state())
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.signal.cancel();
    }
}
