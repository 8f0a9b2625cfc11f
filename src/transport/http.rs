use super::{Transport, TransportError};
use crate::config::ClientConfig;
use crate::types::{ClassificationError, ClassificationRequest, ClassificationResult};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Proxy;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-isagent-request-id";

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy_url) = &config.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy url"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn classify(&self, public_token: &str) -> Result<ClassificationResult> {
        // Correlation id only; the endpoint may ignore it.
        let request_id = Uuid::new_v4().to_string();
        debug!(%request_id, endpoint = %self.endpoint, "sending classification request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&ClassificationRequest { public_token })
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(TransportError::from)?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        debug!(%request_id, status = status.as_u16(), "classification endpoint returned an error");
        match ClassificationError::from_body(status.as_u16(), &body) {
            Some(api) => Err(Error::Api(api)),
            None => Err(Error::Remote {
                status: status.as_u16(),
                body,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
