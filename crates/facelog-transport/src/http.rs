//! reqwest-backed HTTP transport.

use async_trait::async_trait;
use facelog_core::{ApiRequest, ApiResponse, ClientConfig, Transport, TransportError};

/// HTTP transport over a shared `reqwest::Client`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport honouring the configured timeout.
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Self::client_builder(config)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    /// A `reqwest` builder with `config` applied, for callers that need
    /// further tuning before [`from_client`](Self::from_client).
    #[must_use]
    pub fn client_builder(config: &ClientConfig) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder();
        match config.timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Wrap an already configured client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = reqwest::Url::parse(&request.target)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {e}", request.target)))?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_error)?;

        Ok(ApiResponse::new(status, headers, body))
    }
}
