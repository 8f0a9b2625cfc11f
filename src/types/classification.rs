//! Classification request/response bodies.

use serde::{Deserialize, Serialize};

/// Request body for the classification endpoint. The token is forwarded verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest<'a> {
    pub public_token: &'a str,
}

/// Outcome of a successful classification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_agent_client_hint: bool,
    #[serde(default)]
    pub identity: Option<String>,
}

impl ClassificationResult {
    pub fn agent(identity: impl Into<String>) -> Self {
        Self {
            is_agent_client_hint: true,
            identity: Some(identity.into()),
        }
    }

    pub fn human() -> Self {
        Self {
            is_agent_client_hint: false,
            identity: None,
        }
    }
}
