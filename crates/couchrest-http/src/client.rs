//! HTTP document transport backed by `reqwest`.
//!
//! One request in, one response out: no retry, no batching. Any status code
//! is returned to the translator, which decides what a 4xx means.

use async_trait::async_trait;
use std::time::Duration;

use couchrest_core::config::HttpVerb;
use couchrest_core::error::AdapterError;
use couchrest_core::request::{OutboundRequest, RawResponse};
use couchrest_core::transport::DocumentTransport;

/// Configuration for `HttpTransport`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// TCP connect timeout. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: None,
            user_agent: concat!("couchrest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `DocumentTransport` over a shared `reqwest::Client`.
pub struct HttpTransport {
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpTransport {
    pub fn new(config: HttpClientConfig) -> Result<Self, AdapterError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AdapterError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self, AdapterError> {
        Self::new(HttpClientConfig::default())
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

pub(crate) fn method_for(verb: HttpVerb) -> reqwest::Method {
    match verb {
        HttpVerb::Get => reqwest::Method::GET,
        HttpVerb::Post => reqwest::Method::POST,
        HttpVerb::Put => reqwest::Method::PUT,
        HttpVerb::Delete => reqwest::Method::DELETE,
        HttpVerb::Patch => reqwest::Method::PATCH,
        HttpVerb::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl DocumentTransport for HttpTransport {
    async fn send(&self, req: OutboundRequest) -> Result<RawResponse, AdapterError> {
        let OutboundRequest {
            verb,
            url,
            headers,
            body,
        } = req;

        let mut builder = self.http.request(method_for(verb), url.clone());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to read response body: {e}")))?;

        tracing::trace!(status, bytes = body.len(), url = %url, "HTTP response");
        Ok(RawResponse { status, body })
    }
}
