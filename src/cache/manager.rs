//! Classification cache.

use super::key::CacheKey;
use super::slot::{CacheState, Inflight, SharedOutcome, SharedState, Slot};
use crate::transport::Transport;
use crate::types::ClassificationResult;
use crate::{Error, ErrorContext, Result};
use futures::FutureExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Ends this caller's wait only. The shared call keeps running for other waiters.
    pub signal: Option<CancellationToken>,
}

impl ClassifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from a resolved slot.
    pub hits: u64,
    /// Network calls started.
    pub network_calls: u64,
    /// Calls that attached to an already in-flight request.
    pub joins: u64,
    /// Network calls that failed.
    pub failures: u64,
    /// Waits ended by the caller's own signal.
    pub cancellations: u64,
    /// Network calls aborted because every waiter left.
    pub aborted_calls: u64,
}

struct AtomicStats {
    hits: AtomicU64,
    network_calls: AtomicU64,
    joins: AtomicU64,
    failures: AtomicU64,
    cancellations: AtomicU64,
    aborted_calls: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            network_calls: AtomicU64::new(0),
            joins: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            aborted_calls: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            network_calls: self.network_calls.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            aborted_calls: self.aborted_calls.load(Ordering::Relaxed),
        }
    }
}

/// Deduplicating, per-token classification cache.
///
/// Create one per application and share it behind an `Arc`. Calls are spawned on the
/// ambient tokio runtime, so [`classify`](Self::classify) must run inside one.
pub struct ClassificationCache {
    transport: Arc<dyn Transport>,
    state: SharedState,
    stats: Arc<AtomicStats>,
}

enum Attach {
    Cached(Arc<ClassificationResult>),
    Waiting(SharedOutcome, WaiterGuard),
}

/// Counts one caller as interested in an in-flight slot until dropped.
struct WaiterGuard {
    state: SharedState,
    stats: Arc<AtomicStats>,
    key: CacheKey,
    generation: u64,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let aborted = match self.state.lock() {
            Ok(mut state) => state.leave(&self.key, self.generation),
            Err(_) => false,
        };
        if aborted {
            self.stats.aborted_calls.fetch_add(1, Ordering::Relaxed);
            warn!(key = %self.key, "last waiter left; in-flight classification aborted");
        }
    }
}

impl ClassificationCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(CacheState::default())),
            stats: Arc::new(AtomicStats::new()),
        }
    }

    /// Classify the client for `public_token`.
    ///
    /// Returns the cached result when one exists, joins the in-flight call when there
    /// is one, and otherwise starts exactly one network call. Every caller waiting on
    /// the same call receives the same outcome.
    pub async fn classify(
        &self,
        public_token: &str,
        options: ClassifyOptions,
    ) -> Result<Arc<ClassificationResult>> {
        if options.signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            self.stats.cancellations.fetch_add(1, Ordering::Relaxed);
            return Err(Error::Cancelled);
        }

        let (outcome, guard) = match self.attach(public_token)? {
            Attach::Cached(result) => return Ok(result),
            Attach::Waiting(outcome, guard) => (outcome, guard),
        };

        let result = match options.signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    self.stats.cancellations.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %guard.key, "caller cancelled its classification wait");
                    Err(Error::Cancelled)
                }
                settled = outcome => settled,
            },
            None => outcome.await,
        };
        drop(guard);
        result
    }

    /// Resolved result for `public_token`, if any. Never starts a call.
    pub fn peek_cached(&self, public_token: &str) -> Option<Arc<ClassificationResult>> {
        let key = CacheKey::from_token(public_token);
        let state = self.state.lock().ok()?;
        match state.slots.get(&key) {
            Some(Slot::Resolved(result)) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    pub fn is_inflight(&self, public_token: &str) -> bool {
        let key = CacheKey::from_token(public_token);
        self.state
            .lock()
            .map(|state| matches!(state.slots.get(&key), Some(Slot::Pending(_))))
            .unwrap_or(false)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, CacheState>> {
        self.state.lock().map_err(|_| {
            Error::runtime_with_context(
                "classification cache poisoned",
                ErrorContext::new().with_source("classification_cache"),
            )
        })
    }

    fn attach(&self, public_token: &str) -> Result<Attach> {
        let key = CacheKey::from_token(public_token);
        let mut state = self.lock_state()?;

        match state.slots.get_mut(&key) {
            Some(Slot::Resolved(result)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "classification cache hit");
                return Ok(Attach::Cached(Arc::clone(result)));
            }
            Some(Slot::Pending(inflight)) => {
                inflight.waiters += 1;
                self.stats.joins.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, waiters = inflight.waiters, "joining in-flight classification");
                let outcome = inflight.outcome.clone();
                let generation = inflight.generation;
                return Ok(Attach::Waiting(outcome, self.guard(key, generation)));
            }
            None => {}
        }

        // The slot is inserted before the lock is released, so the spawned call
        // cannot complete against a missing slot.
        let generation = state.next_generation();
        let inflight = self.start(key.clone(), generation, public_token);
        let outcome = inflight.outcome.clone();
        state.slots.insert(key.clone(), Slot::Pending(inflight));
        Ok(Attach::Waiting(outcome, self.guard(key, generation)))
    }

    fn guard(&self, key: CacheKey, generation: u64) -> WaiterGuard {
        WaiterGuard {
            state: Arc::clone(&self.state),
            stats: Arc::clone(&self.stats),
            key,
            generation,
        }
    }

    fn start(&self, key: CacheKey, generation: u64, public_token: &str) -> Inflight {
        self.stats.network_calls.fetch_add(1, Ordering::Relaxed);
        info!(
            key = %key,
            generation,
            transport = self.transport.name(),
            "starting classification call"
        );

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let token = public_token.to_owned();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let outcome = transport.classify(&token).await.map(Arc::new);
            match &outcome {
                Ok(result) => info!(
                    key = %task_key,
                    is_agent_client_hint = result.is_agent_client_hint,
                    "classification resolved"
                ),
                Err(e) => {
                    stats.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %task_key, error = %e, "classification failed; slot cleared");
                }
            }
            if let Ok(mut state) = state.lock() {
                if !state.complete(&task_key, generation, &outcome) {
                    debug!(key = %task_key, generation, "slot replaced before completion");
                }
            }
            outcome
        });

        let abort = handle.abort_handle();
        let state = Arc::clone(&self.state);
        let outcome = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(Error::Cancelled),
                Err(e) => {
                    // Panicked call: release the slot so the next caller can retry.
                    let err = Error::runtime_with_context(
                        format!("classification task failed: {}", e),
                        ErrorContext::new().with_source("classification_cache"),
                    );
                    let failed = Err(err.clone());
                    if let Ok(mut state) = state.lock() {
                        state.complete(&key, generation, &failed);
                    }
                    failed
                }
            }
        }
        .boxed()
        .shared();

        Inflight {
            generation,
            outcome,
            waiters: 1,
            abort,
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ClassificationCache {
    /// Drop every cached result and abort in-flight calls. Waiters still attached to an
    /// aborted call receive [`Error::Cancelled`].
    pub fn reset_for_testing(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{wait_until, GatedTransport};
    use crate::transport::TransportError;
    use crate::types::ClassificationError;

    fn cache_over(transport: &Arc<GatedTransport>) -> Arc<ClassificationCache> {
        Arc::new(ClassificationCache::new(transport.clone()))
    }

    fn spawn_classify(
        cache: &Arc<ClassificationCache>,
        options: ClassifyOptions,
    ) -> tokio::task::JoinHandle<Result<Arc<ClassificationResult>>> {
        let cache = Arc::clone(cache);
        tokio::spawn(async move { cache.classify("test-token", options).await })
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_call() {
        let transport = Arc::new(GatedTransport::new());
        transport.push(Ok(ClassificationResult::agent("concurrent bot")));
        let cache = cache_over(&transport);

        let handles: Vec<_> = (0..5)
            .map(|_| spawn_classify(&cache, ClassifyOptions::new()))
            .collect();
        wait_until(|| cache.stats().joins == 4 && transport.calls() == 1).await;
        transport.release(1);

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap().unwrap());
        }
        assert_eq!(transport.calls(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(*results[0], ClassificationResult::agent("concurrent bot"));
        assert_eq!(cache.stats().network_calls, 1);
    }

    #[tokio::test]
    async fn resolved_result_is_reused() {
        let transport = Arc::new(GatedTransport::open());
        transport.push(Ok(ClassificationResult::agent("bot-1")));
        let cache = cache_over(&transport);

        let first = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        let second = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &cache.peek_cached("test-token").unwrap()));
        assert_eq!(cache.stats().hits, 1);
        assert!(!cache.is_inflight("test-token"));
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let transport = Arc::new(GatedTransport::open());
        transport.push(Err(Error::Transport(TransportError::Other("aborted".into()))));
        transport.push(Ok(ClassificationResult::human()));
        let cache = cache_over(&transport);

        let first = cache.classify("test-token", ClassifyOptions::new()).await;
        assert!(matches!(first, Err(Error::Transport(_))));
        assert!(cache.peek_cached("test-token").is_none());
        assert!(!cache.is_inflight("test-token"));

        let second = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        let third = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        assert_eq!(transport.calls(), 2);
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(*second, ClassificationResult::human());
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter() {
        let transport = Arc::new(GatedTransport::new());
        transport.push(Err(Error::Api(ClassificationError {
            status_code: 400,
            error_type: "invalid_token".into(),
            error_message: "Invalid public token".into(),
            error_url: "https://docs.example/errors".into(),
            request_id: None,
            error_details: None,
        })));
        let cache = cache_over(&transport);

        let handles: Vec<_> = (0..3)
            .map(|_| spawn_classify(&cache, ClassifyOptions::new()))
            .collect();
        wait_until(|| cache.stats().joins == 2).await;
        transport.release(1);

        for h in handles {
            let err = h.await.unwrap().unwrap_err();
            assert_eq!(err.api_error().map(|e| e.status_code), Some(400));
            assert!(err.to_string().contains("Invalid public token"));
        }
        assert_eq!(transport.calls(), 1);
        assert!(cache.peek_cached("test-token").is_none());
    }

    #[tokio::test]
    async fn one_cancelled_waiter_leaves_the_call_running() {
        let transport = Arc::new(GatedTransport::new());
        transport.push(Ok(ClassificationResult::agent("bot-1")));
        let cache = cache_over(&transport);

        let signal = CancellationToken::new();
        let cancelled = spawn_classify(&cache, ClassifyOptions::new().with_signal(signal.clone()));
        let patient = spawn_classify(&cache, ClassifyOptions::new());
        wait_until(|| cache.stats().joins == 1 && transport.calls() == 1).await;

        signal.cancel();
        assert!(cancelled.await.unwrap().unwrap_err().is_cancelled());
        assert!(cache.is_inflight("test-token"));

        transport.release(1);
        let result = patient.await.unwrap().unwrap();
        assert_eq!(result.identity.as_deref(), Some("bot-1"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.stats().cancellations, 1);
        assert_eq!(cache.stats().aborted_calls, 0);
    }

    #[tokio::test]
    async fn last_waiter_leaving_aborts_the_call() {
        let transport = Arc::new(GatedTransport::new());
        transport.push(Ok(ClassificationResult::agent("bot-1")));
        let cache = cache_over(&transport);

        let signal = CancellationToken::new();
        let waiter = spawn_classify(&cache, ClassifyOptions::new().with_signal(signal.clone()));
        wait_until(|| transport.calls() == 1).await;
        signal.cancel();
        assert!(waiter.await.unwrap().unwrap_err().is_cancelled());

        assert!(!cache.is_inflight("test-token"));
        assert_eq!(cache.stats().aborted_calls, 1);

        // The aborted call never consumed its scripted response.
        transport.release(1);
        let result = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        assert!(result.is_agent_client_hint);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn dropped_future_counts_as_leaving() {
        let transport = Arc::new(GatedTransport::new());
        let cache = cache_over(&transport);

        let waiter = spawn_classify(&cache, ClassifyOptions::new());
        wait_until(|| transport.calls() == 1).await;
        waiter.abort();
        wait_until(|| !cache.is_inflight("test-token")).await;
        assert_eq!(cache.stats().aborted_calls, 1);
    }

    #[tokio::test]
    async fn cancelled_signal_skips_the_network() {
        let transport = Arc::new(GatedTransport::open());
        let cache = cache_over(&transport);

        let signal = CancellationToken::new();
        signal.cancel();
        let err = cache
            .classify("test-token", ClassifyOptions::new().with_signal(signal))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 0);
        assert_eq!(cache.stats().network_calls, 0);
    }

    #[tokio::test]
    async fn tokens_never_share_a_slot() {
        let transport = Arc::new(GatedTransport::open());
        transport.push(Ok(ClassificationResult::agent("bot-a")));
        transport.push(Ok(ClassificationResult::human()));
        let cache = cache_over(&transport);

        let a = cache.classify("token-a", ClassifyOptions::new()).await.unwrap();
        let b = cache.classify("token-b", ClassifyOptions::new()).await.unwrap();

        assert!(a.is_agent_client_hint);
        assert!(!b.is_agent_client_hint);
        assert_eq!(transport.tokens(), vec!["token-a", "token-b"]);
        assert!(cache.peek_cached("token-c").is_none());
    }

    #[tokio::test]
    async fn reset_clears_resolved_slots() {
        let transport = Arc::new(GatedTransport::open());
        transport.push(Ok(ClassificationResult::human()));
        transport.push(Ok(ClassificationResult::agent("bot-2")));
        let cache = cache_over(&transport);

        cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        cache.reset_for_testing();
        assert!(cache.peek_cached("test-token").is_none());

        let again = cache.classify("test-token", ClassifyOptions::new()).await.unwrap();
        assert_eq!(again.identity.as_deref(), Some("bot-2"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn reset_aborts_inflight_calls() {
        let transport = Arc::new(GatedTransport::new());
        transport.push(Ok(ClassificationResult::human()));
        let cache = cache_over(&transport);

        let waiter = spawn_classify(&cache, ClassifyOptions::new());
        wait_until(|| transport.calls() == 1).await;
        cache.reset_for_testing();

        assert!(waiter.await.unwrap().unwrap_err().is_cancelled());
        assert!(!cache.is_inflight("test-token"));
        assert!(cache.peek_cached("test-token").is_none());
    }
}
