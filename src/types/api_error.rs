//! Structured error body returned by the classification endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error reported by the endpoint on a non-success response.
///
/// Display output:
///
/// ```text
/// [400] invalid_token
/// Invalid public token
/// See https://docs.example/errors for more information.
/// request_id: req-123
/// Details:
/// {"field":"public_token"}
/// ```
///
/// The `request_id` and `Details` lines only appear when those fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationError {
    #[serde(default)]
    pub status_code: u16,
    pub error_type: String,
    pub error_message: String,
    #[serde(default)]
    pub error_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<serde_json::Value>,
}

impl ClassificationError {
    /// Parse an error body, falling back to the HTTP status when the body has no
    /// `status_code` of its own.
    pub fn from_body(http_status: u16, body: &str) -> Option<Self> {
        let mut err: ClassificationError = serde_json::from_str(body).ok()?;
        if err.status_code == 0 {
            err.status_code = http_status;
        }
        Some(err)
    }
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.status_code, self.error_type)?;
        writeln!(f, "{}", self.error_message)?;
        writeln!(f, "See {} for more information.", self.error_url)?;
        if let Some(id) = &self.request_id {
            writeln!(f, "request_id: {}", id)?;
        }
        if let Some(details) = &self.error_details {
            writeln!(f, "Details: ")?;
            writeln!(f, "{}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ClassificationError {}
