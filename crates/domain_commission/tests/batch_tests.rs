//! Tests for batch preparation, summaries and export against realistic snapshots

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{AgentId, CommissionId, Currency, Timezone};
use domain_commission::{
    classify, prepare_mark_paid, selected_total, summarize_by_agent, write_csv, Commission,
    CommissionType, PaymentStatus, PayoutSummary, Selection, SkipReason,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
}

fn snapshot() -> Vec<Commission> {
    let mut rows = Vec::new();

    let mut ready = Commission::new(CommissionId::new("ready"), AgentId::new("ag-1"), dec!(120));
    ready.payment_captured = true;
    ready.eligible_for_payout_at = Some(now() - Duration::days(1));
    rows.push(ready);

    let mut held = Commission::new(CommissionId::new("held"), AgentId::new("ag-1"), dec!(80));
    held.payment_captured = true;
    held.eligible_for_payout_at = Some(now() + Duration::days(4));
    rows.push(held);

    let mut upline = Commission::new(CommissionId::new("upline"), AgentId::new("ag-2"), dec!(15));
    upline.commission_type = CommissionType::Override;
    upline.payment_captured = true;
    rows.push(upline);

    let mut settled = Commission::new(CommissionId::new("settled"), AgentId::new("ag-2"), dec!(60));
    settled.payment_captured = true;
    settled.payment_status = PaymentStatus::Paid;
    settled.payment_date = Some(now() - Duration::days(7));
    rows.push(settled);

    rows
}

#[test]
fn test_select_all_then_prepare() {
    let rows = snapshot();
    let mut selection = Selection::new();
    selection.select_all_eligible(&rows, now());
    selection.select(CommissionId::new("settled"));

    let total = selected_total(&rows, &selection.ids(), Currency::USD);
    assert_eq!(total.amount(), dec!(195));

    let plan = prepare_mark_paid(
        &rows,
        &selection.ids(),
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
        now(),
    )
    .unwrap();

    assert_eq!(
        plan.request.commission_ids,
        vec![CommissionId::new("ready"), CommissionId::new("upline")]
    );
    assert_eq!(plan.total, dec!(135));
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].reason, SkipReason::AlreadyPaid);
}

#[test]
fn test_summary_views_agree() {
    let rows = snapshot();
    let buckets = classify(&rows, now(), &Timezone::default());
    let summary = PayoutSummary::from_classification(&buckets, Currency::USD);
    let agents = summarize_by_agent(&rows, now());

    let eligible: rust_decimal::Decimal = agents.iter().map(|a| a.eligible_total).sum();
    let paid: rust_decimal::Decimal = agents.iter().map(|a| a.paid_total).sum();
    assert_eq!(summary.unpaid.total.amount(), eligible);
    assert_eq!(summary.paid.total.amount(), paid);
    assert_eq!(summary.scheduled.count, 0);
    assert_eq!(agents[0].locked_total, dec!(80));
}

#[test]
fn test_export_unpaid_bucket() {
    let rows = snapshot();
    let buckets = classify(&rows, now(), &Timezone::default());

    let mut out = Vec::new();
    let written = write_csv(&mut out, &buckets.unpaid, now()).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(written, 2);
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("upline,ag-2,,override,15,unpaid,unpaid_eligible,true,,"));
}
