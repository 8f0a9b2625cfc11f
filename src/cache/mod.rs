//! 分类缓存模块：对同一令牌的分类请求去重，并在进程生命周期内缓存成功结果。
//!
//! # Classification Cache Module
//!
//! One classification call per token, shared by every concurrent caller.
//!
//! ## Overview
//!
//! Each token maps to a slot that is either absent, in flight or resolved:
//! - the first caller for an absent slot starts exactly one network call;
//! - callers arriving while it is in flight join the same shared future;
//! - a success becomes the permanent value for the slot and is returned
//!   without any new call;
//! - a failure empties the slot again, so the next caller starts a fresh attempt.
//!
//! Every caller may bring its own [`CancellationToken`](tokio_util::sync::CancellationToken)
//! that ends only that caller's wait. The call itself is aborted only when the last
//! waiter goes away.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ClassificationCache`] | Slot owner: dedup, caching, cancellation |
//! | [`ClassifyOptions`] | Per-call options (cancellation signal) |
//! | [`CacheStats`] | Counters for hits, joins, calls and failures |
//! | [`CacheKey`] | Slot key derived from the token hash |
//!
//! ## Example
//!
//! ```rust,no_run
//! use is_agent::cache::{ClassificationCache, ClassifyOptions};
//! use is_agent::config::ClientConfig;
//! use is_agent::transport::HttpTransport;
//! use std::sync::Arc;
//!
//! # async fn run() -> is_agent::Result<()> {
//! let transport = HttpTransport::new(&ClientConfig::default())?;
//! let cache = ClassificationCache::new(Arc::new(transport));
//!
//! let result = cache.classify("public-token-test-123", ClassifyOptions::new()).await?;
//! // Later lookups are synchronous.
//! assert!(cache.peek_cached("public-token-test-123").is_some());
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

mod key;
mod manager;
mod slot;

pub use key::CacheKey;
pub use manager::{CacheStats, ClassificationCache, ClassifyOptions};
