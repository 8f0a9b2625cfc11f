use crate::cache::ClassificationCache;
use crate::client::core::IsAgentClient;
use crate::config::ClientConfig;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`IsAgentClient`].
///
/// Starts from [`ClientConfig::from_env`]; explicit settings win over the environment.
pub struct IsAgentClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl IsAgentClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::from_env(),
            transport: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn public_token(mut self, token: impl Into<String>) -> Self {
        self.config.public_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Use a custom transport instead of HTTP. The HTTP settings are then unused.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<IsAgentClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        Ok(IsAgentClient {
            config: self.config,
            cache: Arc::new(ClassificationCache::new(transport)),
        })
    }
}

impl Default for IsAgentClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
