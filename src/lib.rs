//! # is-agent
//!
//! 判断当前客户端是自动化代理还是人类：每个会话只调用一次远程分类接口，并在任意多个调用方之间共享结果。
//!
//! Agent-vs-human client classification with a deduplicated, shared request cache.
//!
//! ## Overview
//!
//! The remote endpoint decides whether the current client is an automated agent (bot,
//! crawler, script) or a human. This crate makes sure that decision is requested once:
//!
//! - **Deduplicated**: concurrent callers for the same token share one network call
//! - **Cached**: a success is reused for the lifetime of the cache, failures are not
//! - **Observable**: every observer gets loading / error / success phases of its own
//! - **Cancellable**: an observer that goes away stops waiting without disturbing others
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use is_agent::IsAgentClient;
//!
//! #[tokio::main]
//! async fn main() -> is_agent::Result<()> {
//!     let client = IsAgentClient::builder().build()?;
//!
//!     let result = client.classify("public-token-test-123").await?;
//!     println!("agent: {} ({:?})", result.is_agent_client_hint, result.identity);
//!
//!     // Already resolved: no further network calls.
//!     assert!(client.peek_cached("public-token-test-123").is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Per-token request deduplication and result caching |
//! | [`observe`] | Observers and conditional views over the shared result |
//! | [`client`] | Application-level owner of configuration and cache |
//! | [`transport`] | Endpoint transport trait and HTTP implementation |
//! | [`types`] | Wire types: request, result, structured error |
//! | [`config`] | Configuration from defaults, YAML and environment |

pub mod cache;
pub mod client;
pub mod config;
pub mod observe;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use cache::{CacheStats, ClassificationCache, ClassifyOptions};
pub use client::{IsAgentClient, IsAgentClientBuilder};
pub use config::ClientConfig;
pub use observe::{AgentContext, AgentState, Audience, ConditionalView, Observer, ViewProps};
pub use transport::Transport;
pub use types::{ClassificationError, ClassificationResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
