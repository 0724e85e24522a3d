//! Commissions Backend Adapter
//!
//! Implements [`CommissionPort`] over the backend's REST API:
//!
//! - `GET  {base}/commissions?startDate=&endDate=[&agentId=]`
//! - `POST {base}/commissions/mark-paid`
//! - `GET  {base}/health`
//!
//! # Error Handling
//!
//! Backend statuses are mapped to `PortError` variants:
//! - 400/422 -> `PortError::Validation`
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 409 -> `PortError::Conflict`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Other -> `PortError::Internal`

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
};
use domain_commission::{CommissionPort, CommissionQuery, MarkPaidReceipt, MarkPaidRequest};

use crate::circuit_breaker::CircuitBreaker;
use crate::client::{HttpClient, RetryPolicy};
use crate::config::BackendConfig;

const SERVICE_NAME: &str = "commissions-backend";
const ADAPTER_ID: &str = "http-commission-adapter";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP adapter for the commissions backend
#[derive(Debug)]
pub struct HttpCommissionAdapter {
    config: BackendConfig,
    client: HttpClient,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl HttpCommissionAdapter {
    /// Creates an adapter for the configured backend
    ///
    /// # Errors
    ///
    /// Returns `PortError::Validation` for an unusable API key and
    /// `PortError::Internal` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, PortError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| PortError::validation("backend api key contains invalid header characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.retry_attempts as usize)
            .base_backoff(config.base_backoff())
            .user_agent(concat!("commission-desk/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        let circuit_breaker = config
            .circuit_breaker
            .clone()
            .map(|cb| Arc::new(CircuitBreaker::new(cb)));

        Ok(Self {
            config,
            client,
            circuit_breaker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Checks if the circuit breaker is open (blocking requests)
    pub async fn is_circuit_open(&self) -> bool {
        match &self.circuit_breaker {
            Some(cb) => !cb.is_available().await,
            None => false,
        }
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        policy: RetryPolicy,
        metadata: Option<&OperationMetadata>,
    ) -> Result<Response, PortError> {
        if let Some(cb) = &self.circuit_breaker {
            if !cb.try_acquire().await {
                return Err(PortError::ServiceUnavailable {
                    service: format!("{} (circuit open)", SERVICE_NAME),
                });
            }
        }

        let builder = match metadata.and_then(|m| m.correlation_id.as_deref()) {
            Some(id) => builder.header(REQUEST_ID_HEADER, id),
            None => builder,
        };

        let result = match self.client.send(builder, policy).await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(error_for_response(response).await),
            Err(e) => Err(e),
        };

        if let Some(cb) = &self.circuit_breaker {
            match &result {
                Err(e) if e.is_transient() => cb.record_failure().await,
                _ => cb.record_success(),
            }
        }

        result
    }
}

/// Maps a non-success backend response to a port error
async fn error_for_response(response: Response) -> PortError {
    let status = response.status();
    let path = response.url().path().to_string();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let message = backend_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    warn!(%status, path = %path, message = %message, "Backend returned an error");

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PortError::Validation { message },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized { message },
        StatusCode::NOT_FOUND => PortError::not_found("endpoint", path),
        StatusCode::CONFLICT => PortError::Conflict { message },
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(1),
        },
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: SERVICE_NAME.to_string(),
        },
        _ => PortError::internal(format!("unexpected status {}: {}", status, message)),
    }
}

/// Extracts `error` or `message` from a JSON error body
fn backend_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

impl DomainPort for HttpCommissionAdapter {}

#[async_trait]
impl HealthCheckable for HttpCommissionAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        if self.is_circuit_open().await {
            return HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Degraded,
                latency_ms: 0,
                message: Some("Circuit breaker is open".to_string()),
                checked_at: Utc::now(),
            };
        }

        let request = self.client.request(Method::GET, self.config.endpoint("health"));
        let result = self.client.send(request, RetryPolicy::ConnectOnly).await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, message) = match result {
            Ok(response) if response.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(response) => (
                AdapterHealth::Unhealthy,
                Some(format!("backend health returned {}", response.status())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CommissionPort for HttpCommissionAdapter {
    async fn fetch_commissions(
        &self,
        query: &CommissionQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Value, PortError> {
        let mut params = vec![
            ("startDate", query.date_range.start.format("%Y-%m-%d").to_string()),
            ("endDate", query.date_range.end.format("%Y-%m-%d").to_string()),
        ];
        if let Some(agent_id) = &query.agent_id {
            params.push(("agentId", agent_id.to_string()));
        }

        let request = self
            .client
            .request(Method::GET, self.config.endpoint("commissions"))
            .query(&params);
        let response = self
            .execute(request, RetryPolicy::Idempotent, metadata.as_ref())
            .await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| PortError::transformation(format!("commission payload is not JSON: {}", e)))
    }

    async fn mark_paid(
        &self,
        request: &MarkPaidRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<MarkPaidReceipt, PortError> {
        let builder = self
            .client
            .request(Method::POST, self.config.endpoint("commissions/mark-paid"))
            .json(request);
        let response = self
            .execute(builder, RetryPolicy::ConnectOnly, metadata.as_ref())
            .await?;

        // the body is informational; an empty or non-JSON body still means success
        let body = response.text().await.unwrap_or_default();
        let receipt = serde_json::from_str::<MarkPaidReceipt>(&body).unwrap_or_default();

        info!(
            submitted = request.commission_ids.len(),
            updated = ?receipt.updated,
            initiated_by = metadata.as_ref().and_then(|m| m.initiated_by.as_deref()).unwrap_or("-"),
            "Submitted mark-as-paid batch to backend"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message() {
        assert_eq!(backend_message(r#"{"error":"bad ids"}"#).as_deref(), Some("bad ids"));
        assert_eq!(backend_message(r#"{"message":"nope","error":"x"}"#).as_deref(), Some("nope"));
        assert_eq!(backend_message("<html>"), None);
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = BackendConfig {
            api_key: Some("bad\nkey".to_string()),
            ..BackendConfig::new("http://localhost")
        };
        assert!(matches!(
            HttpCommissionAdapter::new(config),
            Err(PortError::Validation { .. })
        ));
    }
}
