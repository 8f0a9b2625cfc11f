//! Application-level entry point.
//!
//! [`IsAgentClient`] owns the configuration and the process's
//! [`ClassificationCache`](crate::cache::ClassificationCache); create it once at
//! application start and hand out [`AgentContext`](crate::observe::AgentContext)s.

pub mod builder;
pub mod core;

pub use builder::IsAgentClientBuilder;
pub use core::IsAgentClient;
