use crate::cache::{CacheStats, ClassificationCache, ClassifyOptions};
use crate::config::ClientConfig;
use crate::observe::AgentContext;
use crate::types::ClassificationResult;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;

use super::builder::IsAgentClientBuilder;

/// Owner of the classification cache for one application.
pub struct IsAgentClient {
    pub(crate) config: ClientConfig,
    pub(crate) cache: Arc<ClassificationCache>,
}

impl IsAgentClient {
    pub fn builder() -> IsAgentClientBuilder {
        IsAgentClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ClassificationCache> {
        &self.cache
    }

    pub async fn classify(&self, public_token: &str) -> Result<Arc<ClassificationResult>> {
        self.cache.classify(public_token, ClassifyOptions::new()).await
    }

    pub async fn classify_with(
        &self,
        public_token: &str,
        options: ClassifyOptions,
    ) -> Result<Arc<ClassificationResult>> {
        self.cache.classify(public_token, options).await
    }

    pub fn peek_cached(&self, public_token: &str) -> Option<Arc<ClassificationResult>> {
        self.cache.peek_cached(public_token)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn context(&self, public_token: impl Into<Arc<str>>) -> AgentContext {
        AgentContext::new(Arc::clone(&self.cache), public_token)
    }

    /// Context for the configured `public_token`.
    pub fn default_context(&self) -> Result<AgentContext> {
        let token = self.config.public_token.as_deref().ok_or_else(|| {
            Error::configuration_with_context(
                "missing public token",
                ErrorContext::new()
                    .with_field_path("config.public_token")
                    .with_details("set ISAGENT_PUBLIC_TOKEN or public_token in the config file"),
            )
        })?;
        Ok(self.context(token))
    }
}

impl std::fmt::Debug for IsAgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsAgentClient")
            .field("base_url", &self.config.base_url)
            .field("transport", &self.cache.transport_name())
            .finish_non_exhaustive()
    }
}
