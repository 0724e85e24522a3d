//! Tests for the commissions backend adapter against a mock HTTP server

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use core_kernel::{
    AdapterHealth, AgentId, CircuitBreakerConfig, CommissionId, DateRange, HealthCheckable,
    OperationMetadata, PortError,
};
use domain_commission::{CommissionPort, CommissionQuery, MarkPaidRequest};
use infra_http::{BackendConfig, HttpCommissionAdapter};

fn config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
        retry_attempts: 3,
        base_backoff_ms: 1,
        circuit_breaker: None,
        ..BackendConfig::new(server.uri())
    }
}

fn adapter(server: &MockServer) -> HttpCommissionAdapter {
    HttpCommissionAdapter::new(config(server)).expect("adapter")
}

fn week() -> DateRange {
    DateRange::week_containing(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap())
}

fn mark_paid_request() -> MarkPaidRequest {
    MarkPaidRequest {
        commission_ids: vec![CommissionId::new("cm-1"), CommissionId::new("cm-2")],
        payment_date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
    }
}

#[tokio::test]
async fn fetch_sends_date_range_agent_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commissions"))
        .and(query_param("startDate", "2024-06-09"))
        .and(query_param("endDate", "2024-06-15"))
        .and(query_param("agentId", "ag-7"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-request-id", "req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "cm-1", "agentId": "ag-7"}])))
        .expect(1)
        .mount(&server)
        .await;

    let query = CommissionQuery::new(week()).for_agent(AgentId::new("ag-7"));
    let payload = adapter(&server)
        .fetch_commissions(&query, Some(OperationMetadata::with_correlation_id("req-1")))
        .await
        .expect("payload");

    assert_eq!(payload[0]["id"], "cm-1");
}

#[tokio::test]
async fn fetch_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commissions"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/commissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let payload = adapter(&server)
        .fetch_commissions(&CommissionQuery::new(week()), None)
        .await
        .expect("payload");
    assert_eq!(payload, json!([]));
}

#[tokio::test]
async fn fetch_exhausting_retries_is_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .fetch_commissions(&CommissionQuery::new(week()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::ServiceUnavailable { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn status_codes_map_to_port_errors() {
    let cases = [
        (401, "unauthorized"),
        (403, "unauthorized"),
        (404, "not_found"),
        (409, "conflict"),
        (422, "validation"),
        (429, "rate_limited"),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("retry-after", "7")
                    .set_body_json(json!({"error": "rejected"})),
            )
            .mount(&server)
            .await;

        let err = adapter(&server)
            .fetch_commissions(&CommissionQuery::new(week()), None)
            .await
            .unwrap_err();

        let kind = match &err {
            PortError::Unauthorized { .. } => "unauthorized",
            PortError::NotFound { .. } => "not_found",
            PortError::Conflict { .. } => "conflict",
            PortError::Validation { message } => {
                assert_eq!(message, "rejected");
                "validation"
            }
            PortError::RateLimited { retry_after_secs } => {
                assert_eq!(*retry_after_secs, 7);
                "rate_limited"
            }
            other => panic!("unexpected error for {}: {:?}", status, other),
        };
        assert_eq!(kind, expected, "status {}", status);
    }
}

#[tokio::test]
async fn non_json_payload_is_a_transformation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .fetch_commissions(&CommissionQuery::new(week()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Transformation { .. }));
}

#[tokio::test]
async fn mark_paid_posts_wire_payload_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commissions/mark-paid"))
        .and(body_json(json!({"commissionIds": ["cm-1", "cm-2"], "paymentDate": "2024-06-14"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = adapter(&server)
        .mark_paid(&mark_paid_request(), None)
        .await
        .expect("receipt");
    assert_eq!(receipt.updated, Some(2));
}

#[tokio::test]
async fn mark_paid_is_not_retried_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .mark_paid(&mark_paid_request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn mark_paid_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let receipt = adapter(&server)
        .mark_paid(&mark_paid_request(), None)
        .await
        .expect("receipt");
    assert_eq!(receipt.updated, None);
}

#[tokio::test]
async fn circuit_opens_after_repeated_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = HttpCommissionAdapter::new(BackendConfig {
        retry_attempts: 1,
        circuit_breaker: Some(CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            reset_timeout_secs: 300,
        }),
        ..config(&server)
    })
    .expect("adapter");

    for _ in 0..2 {
        adapter
            .fetch_commissions(&CommissionQuery::new(week()), None)
            .await
            .unwrap_err();
    }
    assert!(adapter.is_circuit_open().await);

    let err = adapter
        .fetch_commissions(&CommissionQuery::new(week()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::ServiceUnavailable { .. }));
    assert_eq!(adapter.health_check().await.status, AdapterHealth::Degraded);
}

#[tokio::test]
async fn health_check_reports_backend_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let health = adapter(&server).health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy);

    let down = HttpCommissionAdapter::new(BackendConfig {
        retry_attempts: 1,
        timeout_secs: 1,
        ..BackendConfig::new("http://127.0.0.1:9")
    })
    .expect("adapter");
    assert_eq!(down.health_check().await.status, AdapterHealth::Unhealthy);
}
