//! Client configuration: defaults, YAML files and environment overrides.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.isagent.dev";
pub const DEFAULT_ENDPOINT_PATH: &str = "/is_agent";

/// Connection settings for the classification endpoint.
///
/// No timeout is set by default; timeout behavior belongs to the transport and is only
/// applied when configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub endpoint_path: String,
    pub timeout_secs: Option<u64>,
    pub proxy_url: Option<String>,
    pub public_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            timeout_secs: None,
            proxy_url: None,
            public_token: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the process environment.
    ///
    /// - `ISAGENT_BASE_URL`
    /// - `ISAGENT_HTTP_TIMEOUT_SECS`
    /// - `ISAGENT_PROXY_URL`
    /// - `ISAGENT_PUBLIC_TOKEN`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("failed to read configuration: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply environment variables on top of the current values. Unparseable numeric
    /// values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("ISAGENT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = env::var("ISAGENT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.timeout_secs = Some(secs);
        }
        if let Ok(proxy) = env::var("ISAGENT_PROXY_URL") {
            self.proxy_url = Some(proxy);
        }
        if let Ok(token) = env::var("ISAGENT_PUBLIC_TOKEN") {
            self.public_token = Some(token);
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn with_public_token(mut self, token: impl Into<String>) -> Self {
        self.public_token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Full endpoint URL, validated.
    pub fn endpoint_url(&self) -> Result<Url> {
        let path = if self.endpoint_path.starts_with('/') {
            self.endpoint_path.clone()
        } else {
            format!("/{}", self.endpoint_path)
        };
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid endpoint url: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(raw),
            )
        })
    }
}
