//! HTTP client with retry and backoff
//!
//! Idempotent requests are retried on 5xx responses and on transport
//! failures. Non-idempotent requests (the mark-as-paid submission) are only
//! retried when the connection could not be established, so the backend has
//! never seen them.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use core_kernel::PortError;

/// Which failures a request may be retried on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry on 5xx, timeouts and connection failures
    Idempotent,
    /// Retry only when the connection was never established
    ConnectOnly,
}

/// HTTP client with built-in retry and timeout support
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
    timeout: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Executes the request, retrying according to `policy`
    ///
    /// Returns the last response even when its status is an error; status
    /// mapping belongs to the caller.
    pub async fn send(&self, builder: RequestBuilder, policy: RetryPolicy) -> Result<Response, PortError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned = builder.try_clone().ok_or_else(|| {
                PortError::internal("request body cannot be cloned; buffer the body to enable retries")
            })?;
            let request = cloned
                .build()
                .map_err(|err| PortError::internal(format!("invalid request: {}", err)))?;

            let method = request.method().clone();
            let url = request.url().clone();
            let last_attempt = attempt + 1 >= attempts;
            debug!(attempt = attempt + 1, %method, %url, "Sending backend request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "Received backend response");

                    if status.is_server_error() && policy == RetryPolicy::Idempotent && !last_attempt {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "Backend request failed");

                    if !last_attempt && should_retry_error(&err, policy) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }
                    return Err(self.transport_error(err, &method, url.path()));
                }
            }
        }

        Err(PortError::internal("http client exhausted retries without producing a result"))
    }

    fn transport_error(&self, err: reqwest::Error, method: &Method, path: &str) -> PortError {
        if err.is_timeout() {
            return PortError::Timeout {
                operation: format!("{} {}", method, path),
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if err.is_connect() || err.is_request() {
            return PortError::Connection {
                message: format!("{} {}: {}", method, path, err),
                source: Some(Box::new(err)),
            };
        }
        PortError::Internal {
            message: format!("{} {}: {}", method, path, err),
            source: Some(Box::new(err)),
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total number of attempts, initial try included
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
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

    pub fn build(self) -> Result<HttpClient, PortError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| PortError::Internal {
            message: "failed to build http client".to_string(),
            source: Some(Box::new(err)),
        })?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
            timeout: self.timeout,
        })
    }
}

fn should_retry_error(err: &reqwest::Error, policy: RetryPolicy) -> bool {
    match policy {
        RetryPolicy::Idempotent => err.is_timeout() || err.is_connect() || err.is_request(),
        RetryPolicy::ConnectOnly => err.is_connect(),
    }
}
