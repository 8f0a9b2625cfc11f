//! 类型模块：定义分类接口的请求、结果与结构化错误类型。
//!
//! # Types Module
//!
//! Wire-level types exchanged with the classification endpoint.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClassificationRequest`] | Request body carrying the public token |
//! | [`ClassificationResult`] | Agent hint and optional identity for the session |
//! | [`ClassificationError`] | Structured error body returned on non-success status |
//!
//! ## Example
//!
//! ```rust
//! use is_agent::types::ClassificationResult;
//!
//! let result: ClassificationResult =
//!     serde_json::from_str(r#"{"is_agent_client_hint": true, "identity": "bot-1"}"#).unwrap();
//! assert!(result.is_agent_client_hint);
//! assert_eq!(result.identity.as_deref(), Some("bot-1"));
//! ```

pub mod api_error;
pub mod classification;

pub use api_error::ClassificationError;
pub use classification::{ClassificationRequest, ClassificationResult};
