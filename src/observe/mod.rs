//! 观察层：为每个观察者提供加载/错误/成功状态，并按代理或人类条件渲染内容。
//!
//! # Observation Module
//!
//! Built on the [`ClassificationCache`]: every [`Observer`] gets its own view of the
//! shared classification for one token.
//!
//! - An observer created after the result is cached starts in the success phase and
//!   never issues a call.
//! - Otherwise it starts loading, and its first activation starts or joins the shared
//!   request with a cancellation signal tied to the observer.
//! - Dropping the observer cancels that signal; other observers keep waiting.
//!
//! [`ConditionalView`] wraps an observer and picks between a loading placeholder, an
//! error placeholder and its children.
//!
//! ## Example
//!
//! ```rust,no_run
//! use is_agent::observe::{AgentContext, ViewProps};
//! use is_agent::IsAgentClient;
//!
//! # async fn run() -> is_agent::Result<()> {
//! let client = IsAgentClient::builder().build()?;
//! let ctx: AgentContext = client.context("public-token-test-123");
//!
//! let mut banner = ctx.render_if_human(
//!     ViewProps::new("Welcome, human user!")
//!         .loading("Checking...")
//!         .error("Could not check bot status"),
//! );
//! println!("{:?}", banner.render());
//! println!("{:?}", banner.render_settled().await);
//!
//! let mut observer = ctx.observe();
//! let state = observer.settled().await;
//! println!("agent: {:?}, identity: {:?}", state.is_agent_client_hint(), state.identity());
//! # Ok(())
//! # }
//! ```

mod observer;
mod render;
mod state;

pub use observer::Observer;
pub use render::{select, Audience, ConditionalView, ErrorPlaceholder, ViewProps};
pub use state::{AgentState, Phase};

use crate::cache::ClassificationCache;
use std::sync::Arc;

/// Binds a public token to a cache and hands out observers and conditional views.
#[derive(Clone)]
pub struct AgentContext {
    cache: Arc<ClassificationCache>,
    token: Arc<str>,
}

impl AgentContext {
    pub fn new(cache: Arc<ClassificationCache>, public_token: impl Into<Arc<str>>) -> Self {
        Self {
            cache,
            token: public_token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn cache(&self) -> &Arc<ClassificationCache> {
        &self.cache
    }

    pub fn observe(&self) -> Observer {
        Observer::new(Arc::clone(&self.cache), Arc::clone(&self.token))
    }

    /// Children are shown only when the client is classified as an agent.
    pub fn render_if_agent<T: Clone>(&self, props: ViewProps<T>) -> ConditionalView<T> {
        ConditionalView::new(Audience::Agent, props, self.observe())
    }

    /// Children are shown only when the client is classified as a human.
    pub fn render_if_human<T: Clone>(&self, props: ViewProps<T>) -> ConditionalView<T> {
        ConditionalView::new(Audience::Human, props, self.observe())
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("transport", &self.cache.transport_name())
            .finish_non_exhaustive()
    }
}
