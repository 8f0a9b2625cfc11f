//! 传输层：分类接口的网络调用抽象与基于 reqwest 的实现。
//!
//! # Transport Module
//!
//! [`Transport`] is the seam between the classification cache and the remote endpoint.
//! [`HttpTransport`] is the production implementation; tests drive the cache through
//! scripted implementations of the same trait.

mod http;

pub use http::HttpTransport;

use crate::types::ClassificationResult;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Performs one classification round trip.
///
/// Dropping the returned future must abort the outbound request; the cache relies on
/// this when the last interested caller goes away.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn classify(&self, public_token: &str) -> Result<ClassificationResult>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(Arc::new(e))
    }
}
