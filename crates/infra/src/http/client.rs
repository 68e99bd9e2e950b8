use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use schedulr_domain::{ApiError, SchedulrError};
use tracing::debug;

use crate::errors::{api_error_from_reqwest, InfraError};

/// Longest response body excerpt kept in error messages.
const ERROR_BODY_LIMIT: usize = 512;

/// HTTP client shared by provider adapters.
///
/// Each call is a single attempt. Retrying is decided by the core from the
/// [`ApiError`] classification this client produces.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, SchedulrError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute a request once.
    ///
    /// Transport failures are classified for `provider`; a non-success
    /// status becomes an [`ApiError`] carrying the status and a body excerpt.
    pub async fn send(&self, provider: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build().map_err(|err| api_error_from_reqwest(provider, err))?;

        let method = request.method().clone();
        let url = redact_query(request.url());
        debug!(provider, %method, url = %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            let err = err.without_url();
            debug!(provider, %method, url = %url, error = %err, "HTTP request failed");
            api_error_from_reqwest(provider, err)
        })?;

        let status = response.status();
        debug!(provider, %method, url = %url, %status, "received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(provider, status.as_u16(), excerpt(&body)))
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(concat!("schedulr/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, SchedulrError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            SchedulrError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Drop query values (API keys travel there) before logging a URL.
fn redact_query(url: &reqwest::Url) -> String {
    let mut redacted = url.clone();
    if redacted.query().is_some() {
        redacted.set_query(Some("…"));
    }
    redacted.to_string()
}
