//! Integration Tests for the commission desk
//!
//! These tests verify end-to-end workflows that cross intake, classification,
//! batch preparation and the cached snapshot service.

use std::sync::Arc;

use chrono::Duration;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, CommissionId, Currency};
use domain_commission::ports::mock::MockCommissionPort;
use domain_commission::{
    parse_commissions, write_csv, CommissionQuery, CommissionService, IntakeMode, PayoutSummary,
    RejectReason, Selection, ServiceSettings,
};
use test_utils::{
    assert_bucket_ids, assert_classification_consistent, assert_money_amount, CommissionFixtures,
    PayloadFixtures, TemporalFixtures,
};

mod intake_to_payout_workflow {
    use super::*;

    /// Tests that a raw backend payload classifies into the expected buckets
    #[test]
    fn test_payload_to_summary() {
        let now = TemporalFixtures::now();
        let report = parse_commissions(&PayloadFixtures::snapshot(), IntakeMode::Lenient).unwrap();
        assert!(report.rejected.is_empty());

        let buckets = domain_commission::classify(&report.commissions, now, &TemporalFixtures::utc());
        assert_classification_consistent(&buckets, now);
        assert_bucket_ids(&buckets.unpaid, &["eligible", "override"]);
        assert_bucket_ids(&buckets.paid, &["scheduled", "settled"]);
        assert_bucket_ids(&buckets.scheduled, &["scheduled"]);

        let summary = PayoutSummary::from_classification(&buckets, Currency::USD);
        assert_money_amount(&summary.unpaid.total, dec!(155.75));
        assert_money_amount(&summary.paid.total, dec!(275.00));
    }

    /// Tests that loosely typed records are coerced and broken ones reported
    #[test]
    fn test_loose_payload_is_absorbed() {
        let report = parse_commissions(&PayloadFixtures::loosely_typed(), IntakeMode::Lenient).unwrap();

        assert_eq!(report.commissions.len(), 2);
        assert_eq!(report.commissions[0].id.as_str(), "101");
        assert_eq!(report.commissions[0].agent_id.as_str(), "7");
        assert_eq!(report.commissions[0].commission_amount, dec!(12.50));
        assert_eq!(report.commissions[1].commission_amount, dec!(0));
        assert_eq!(report.coerced_amounts, 1);

        let reasons: Vec<RejectReason> = report.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![RejectReason::MissingId, RejectReason::NotAnObject]);
    }

    /// Tests select-all, batch preparation and CSV export over one snapshot
    #[test]
    fn test_select_all_then_export() {
        let now = TemporalFixtures::now();
        let snapshot = CommissionFixtures::snapshot();

        let mut selection = Selection::new();
        selection.select_all_eligible(&snapshot, now);
        let plan = domain_commission::prepare_mark_paid(
            &snapshot,
            &selection.ids(),
            TemporalFixtures::today(),
            now,
        )
        .unwrap();
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.total, dec!(155.75));

        let buckets = domain_commission::classify(&snapshot, now, &TemporalFixtures::utc());
        let mut csv = Vec::new();
        let rows = write_csv(&mut csv, &buckets.unpaid, now).unwrap();
        assert_eq!(rows, 2);
        let text = String::from_utf8(csv).unwrap();
        assert!(text.contains("eligible,agent-1"));
    }
}

mod service_workflow {
    use super::*;

    fn service(port: Arc<MockCommissionPort>) -> CommissionService {
        CommissionService::new(port, ServiceSettings::default())
    }

    /// Tests that paying a batch invalidates the snapshot it came from
    #[tokio::test]
    async fn test_mark_paid_round_trip() {
        let now = TemporalFixtures::now();
        let port = Arc::new(MockCommissionPort::with_commissions(&CommissionFixtures::snapshot()));
        let service = service(port.clone());
        let query = CommissionQuery::new(TemporalFixtures::week());

        let before = service.snapshot(&query, None).await.unwrap();
        assert_eq!(before.classify(now, &TemporalFixtures::utc()).unpaid.len(), 2);

        let ids = vec![CommissionId::new("eligible"), CommissionId::new("locked")];
        let outcome = service
            .mark_paid(&query, &ids, TemporalFixtures::today(), now, None)
            .await
            .unwrap();
        assert_eq!(outcome.plan.request.commission_ids, vec![CommissionId::new("eligible")]);
        assert_eq!(outcome.receipt.updated, Some(1));
        assert_eq!(service.cached_queries().await, 0);

        let after = service.snapshot(&query, None).await.unwrap();
        assert_eq!(port.fetch_count(), 2);
        let buckets = after.classify(now, &TemporalFixtures::utc());
        assert_bucket_ids(&buckets.unpaid, &["override"]);
        assert!(buckets.paid.iter().any(|c| c.id.as_str() == "eligible"));
    }

    /// Tests that agent invalidation leaves other agents' snapshots cached
    #[tokio::test]
    async fn test_agent_invalidation_is_scoped() {
        let port = Arc::new(MockCommissionPort::with_commissions(&CommissionFixtures::snapshot()));
        let service = service(port.clone());
        let week = CommissionQuery::new(TemporalFixtures::week());

        service.snapshot(&week.clone().for_agent(AgentId::new("agent-1")), None).await.unwrap();
        service.snapshot(&week.clone().for_agent(AgentId::new("agent-2")), None).await.unwrap();
        assert_eq!(service.cached_queries().await, 2);

        let dropped = service.invalidate_agent(&AgentId::new("agent-2")).await;
        assert_eq!(dropped, 1);
        assert_eq!(service.cached_queries().await, 1);
    }

    /// Tests that a backend outage surfaces as a transient error
    #[tokio::test]
    async fn test_outage_is_transient() {
        let port = Arc::new(MockCommissionPort::new());
        port.set_unavailable(true);
        let service = service(port);

        let err = service
            .snapshot(&CommissionQuery::new(TemporalFixtures::week()), None)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    /// Tests that a paid commission dated later today still counts as scheduled
    #[tokio::test]
    async fn test_scheduled_today_in_viewer_timezone() {
        let now = TemporalFixtures::now();
        let later_today = test_utils::CommissionBuilder::new("tonight")
            .paid_on(now + Duration::hours(2))
            .build();
        let port = Arc::new(MockCommissionPort::with_commissions(&[later_today]));
        let service = service(port);

        let snapshot = service
            .snapshot(&CommissionQuery::new(TemporalFixtures::week()), None)
            .await
            .unwrap();
        let buckets = snapshot.classify(now, &TemporalFixtures::new_york());
        assert_bucket_ids(&buckets.scheduled, &["tonight"]);
    }
}
