//! Commission Domain Ports
//!
//! The commissions backend is the system of record. This module defines the
//! seam through which the domain reads commission snapshots and submits the
//! batch mark-as-paid mutation, so the backend client can be swapped:
//!
//! - **HTTP Adapter**: calls the commissions backend (`infra_http`)
//! - **Mock Adapter**: in-memory records for tests and local runs
//!
//! Ports return the backend payload as raw JSON. Shape checking happens once,
//! in [`crate::intake`], never in adapters.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_commission::ports::CommissionPort;
//! use std::sync::Arc;
//!
//! let port: Arc<dyn CommissionPort> = Arc::new(HttpCommissionAdapter::new(config)?);
//! let service = CommissionService::new(port, ServiceSettings::default());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, DateRange, DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::batch::{MarkPaidReceipt, MarkPaidRequest};

/// Backend query for one commission snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionQuery {
    pub date_range: DateRange,
    /// Restricts the snapshot to one agent; `None` for the admin view
    pub agent_id: Option<AgentId>,
}

impl CommissionQuery {
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            agent_id: None,
        }
    }

    pub fn for_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }
}

/// Port trait for the commissions backend
#[async_trait]
pub trait CommissionPort: DomainPort + HealthCheckable {
    /// Fetches the raw commission payload for a query
    async fn fetch_commissions(
        &self,
        query: &CommissionQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<serde_json::Value, PortError>;

    /// Submits a batch mark-as-paid mutation
    ///
    /// Sent once per user action; the backend owns idempotency.
    async fn mark_paid(
        &self,
        request: &MarkPaidRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<MarkPaidReceipt, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::{SecondsFormat, Utc};
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult, Timezone};

    use crate::intake::parse_timestamp;

    /// In-memory mock implementation of CommissionPort
    ///
    /// Records are stored as backend JSON so tests can feed malformed rows
    /// through the same intake path the HTTP adapter uses.
    #[derive(Debug, Default)]
    pub struct MockCommissionPort {
        records: Arc<RwLock<Vec<Value>>>,
        submissions: Arc<RwLock<Vec<MarkPaidRequest>>>,
        fetch_count: AtomicUsize,
        unavailable: AtomicBool,
    }

    impl MockCommissionPort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with raw backend records
        pub fn with_records(records: Vec<Value>) -> Self {
            Self {
                records: Arc::new(RwLock::new(records)),
                ..Self::default()
            }
        }

        /// Pre-populates with typed commissions
        pub fn with_commissions(commissions: &[crate::Commission]) -> Self {
            let records = commissions
                .iter()
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect();
            Self::with_records(records)
        }

        /// Replaces the stored records, as a backend-side change would
        pub async fn replace_records(&self, records: Vec<Value>) {
            *self.records.write().await = records;
        }

        /// Makes every call fail with `ServiceUnavailable` while set
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Number of `fetch_commissions` calls served
        pub fn fetch_count(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }

        /// Mark-as-paid requests received, in order
        pub async fn submissions(&self) -> Vec<MarkPaidRequest> {
            self.submissions.read().await.clone()
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: "mock-commissions-backend".to_string(),
                });
            }
            Ok(())
        }
    }

    fn matches(record: &Value, query: &CommissionQuery) -> bool {
        if let Some(agent_id) = &query.agent_id {
            let record_agent = match record.get("agentId") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return true,
            };
            if record_agent != agent_id.as_str() {
                return false;
            }
        }
        match record
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
        {
            Some(created_at) => query.date_range.contains_instant(created_at, &Timezone::default()),
            None => true,
        }
    }

    impl DomainPort for MockCommissionPort {}

    #[async_trait]
    impl HealthCheckable for MockCommissionPort {
        async fn health_check(&self) -> HealthCheckResult {
            let status = if self.unavailable.load(Ordering::SeqCst) {
                AdapterHealth::Unhealthy
            } else {
                AdapterHealth::Healthy
            };
            HealthCheckResult {
                adapter_id: "mock-commission-port".to_string(),
                status,
                latency_ms: 0,
                message: Some("Mock adapter".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl CommissionPort for MockCommissionPort {
        async fn fetch_commissions(
            &self,
            query: &CommissionQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Value, PortError> {
            self.check_available()?;
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let records = self.records.read().await;
            Ok(Value::Array(
                records.iter().filter(|r| matches(r, query)).cloned().collect(),
            ))
        }

        async fn mark_paid(
            &self,
            request: &MarkPaidRequest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<MarkPaidReceipt, PortError> {
            self.check_available()?;
            if request.commission_ids.is_empty() {
                return Err(PortError::validation("commissionIds must not be empty"));
            }

            let paid_on = request
                .payment_date
                .and_time(chrono::NaiveTime::MIN)
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true);

            let mut updated = 0u64;
            let mut records = self.records.write().await;
            for record in records.iter_mut() {
                let Some(fields) = record.as_object_mut() else {
                    continue;
                };
                let selected = fields
                    .get("id")
                    .map(|id| match id {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .is_some_and(|id| request.commission_ids.iter().any(|c| c.as_str() == id));
                if !selected {
                    continue;
                }
                fields.insert("paymentStatus".to_string(), Value::from("paid"));
                fields.insert("paymentDate".to_string(), Value::from(paid_on.clone()));
                updated += 1;
            }

            self.submissions.write().await.push(request.clone());
            Ok(MarkPaidReceipt {
                updated: Some(updated),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockCommissionPort;
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{AdapterHealth, CommissionId};
    use serde_json::json;

    fn week() -> DateRange {
        DateRange::week_containing(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap())
    }

    fn records() -> Vec<serde_json::Value> {
        vec![
            json!({"id": "a", "agentId": "ag-1", "createdAt": "2024-06-10T10:00:00Z", "paymentStatus": "unpaid"}),
            json!({"id": "b", "agentId": "ag-2", "createdAt": "2024-06-11T10:00:00Z", "paymentStatus": "unpaid"}),
            json!({"id": "old", "agentId": "ag-1", "createdAt": "2024-05-01T10:00:00Z", "paymentStatus": "unpaid"}),
        ]
    }

    #[tokio::test]
    async fn test_mock_fetch_filters_by_query() {
        let port = MockCommissionPort::with_records(records());

        let all = port.fetch_commissions(&CommissionQuery::new(week()), None).await.unwrap();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let query = CommissionQuery::new(week()).for_agent(AgentId::new("ag-1"));
        let mine = port.fetch_commissions(&query, None).await.unwrap();
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(port.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_mark_paid_updates_records() {
        let port = MockCommissionPort::with_records(records());
        let request = MarkPaidRequest {
            commission_ids: vec![CommissionId::new("a"), CommissionId::new("missing")],
            payment_date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
        };

        let receipt = port.mark_paid(&request, None).await.unwrap();
        assert_eq!(receipt.updated, Some(1));

        let payload = port.fetch_commissions(&CommissionQuery::new(week()), None).await.unwrap();
        let a = &payload.as_array().unwrap()[0];
        assert_eq!(a["paymentStatus"], "paid");
        assert_eq!(a["paymentDate"], "2024-06-14T00:00:00Z");
        assert_eq!(port.submissions().await, vec![request]);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let port = MockCommissionPort::new();
        port.set_unavailable(true);

        let err = port.fetch_commissions(&CommissionQuery::new(week()), None).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(port.health_check().await.status, AdapterHealth::Unhealthy);
    }
}
