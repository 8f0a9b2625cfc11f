//! Per-token slot state shared by the cache, its spawned calls and waiter guards.

use super::key::CacheKey;
use crate::types::ClassificationResult;
use crate::Error;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

pub(crate) type Outcome = std::result::Result<Arc<ClassificationResult>, Error>;
pub(crate) type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;
pub(crate) type SharedState = Arc<Mutex<CacheState>>;

/// An outstanding network call and the callers waiting on it.
pub(crate) struct Inflight {
    pub generation: u64,
    pub outcome: SharedOutcome,
    pub waiters: usize,
    pub abort: AbortHandle,
}

pub(crate) enum Slot {
    Pending(Inflight),
    Resolved(Arc<ClassificationResult>),
}

/// Absent slots are simply missing from the map.
#[derive(Default)]
pub(crate) struct CacheState {
    pub slots: HashMap<CacheKey, Slot>,
    generation: u64,
}

impl CacheState {
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Success resolves the slot, failure empties it. Returns `false` when the slot no
    /// longer belongs to `generation`, in which case nothing changes.
    pub fn complete(&mut self, key: &CacheKey, generation: u64, outcome: &Outcome) -> bool {
        match self.slots.get(key) {
            Some(Slot::Pending(inflight)) if inflight.generation == generation => {}
            _ => return false,
        }
        match outcome {
            Ok(result) => {
                self.slots
                    .insert(key.clone(), Slot::Resolved(Arc::clone(result)));
            }
            Err(_) => {
                self.slots.remove(key);
            }
        }
        true
    }

    /// Remove one waiter. The last one out aborts the call and empties the slot;
    /// returns `true` in that case.
    pub fn leave(&mut self, key: &CacheKey, generation: u64) -> bool {
        let Some(Slot::Pending(inflight)) = self.slots.get_mut(key) else {
            return false;
        };
        if inflight.generation != generation {
            return false;
        }
        inflight.waiters = inflight.waiters.saturating_sub(1);
        if inflight.waiters > 0 {
            return false;
        }
        inflight.abort.abort();
        self.slots.remove(key);
        true
    }

    pub fn abort_all(&mut self) {
        for slot in self.slots.values() {
            if let Slot::Pending(inflight) = slot {
                inflight.abort.abort();
            }
        }
        self.slots.clear();
    }
}
