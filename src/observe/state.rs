//! Observer state.

use crate::types::ClassificationResult;
use crate::Error;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Error,
    Success,
}

/// What one observer currently knows about the classification.
#[derive(Debug, Clone)]
pub enum AgentState {
    Loading,
    Error(Error),
    /// Shares the cache's result instance.
    Success(Arc<ClassificationResult>),
}

impl AgentState {
    pub fn phase(&self) -> Phase {
        match self {
            AgentState::Loading => Phase::Loading,
            AgentState::Error(_) => Phase::Error,
            AgentState::Success(_) => Phase::Success,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AgentState::Loading)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            AgentState::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&Arc<ClassificationResult>> {
        match self {
            AgentState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// `None` unless the phase is `Success`.
    pub fn is_agent_client_hint(&self) -> Option<bool> {
        self.result().map(|r| r.is_agent_client_hint)
    }

    pub fn identity(&self) -> Option<&str> {
        self.result().and_then(|r| r.identity.as_deref())
    }
}

impl From<Arc<ClassificationResult>> for AgentState {
    fn from(result: Arc<ClassificationResult>) -> Self {
        AgentState::Success(result)
    }
}
