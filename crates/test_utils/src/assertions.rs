//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for payout buckets and totals that
//! give more meaningful error messages than standard assertions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::Money;
use domain_commission::{is_eligible_for_payout, Classification, Commission};

/// Asserts that a bucket holds exactly the given commission ids, in order
pub fn assert_bucket_ids(bucket: &[&Commission], expected: &[&str]) {
    let actual: Vec<&str> = bucket.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        actual, expected,
        "Bucket mismatch: actual={:?}, expected={:?}",
        actual, expected
    );
}

/// Asserts that a Money value has the expected amount
pub fn assert_money_amount(money: &Money, expected: Decimal) {
    assert_eq!(
        money.amount(),
        expected,
        "Money amount mismatch: actual={} {}, expected={}",
        money.currency().symbol(),
        money.amount(),
        expected
    );
}

/// Asserts the structural invariants every classification must satisfy
///
/// # Panics
///
/// Panics if an unpaid commission is not eligible, a paid commission is not
/// marked paid, a scheduled commission is missing from the paid bucket, or a
/// commission appears in both unpaid and paid.
pub fn assert_classification_consistent(buckets: &Classification<'_>, now: DateTime<Utc>) {
    for c in &buckets.unpaid {
        assert!(
            is_eligible_for_payout(c, now),
            "Commission {} in unpaid bucket is not eligible",
            c.id
        );
        assert!(
            !buckets.paid.iter().any(|p| p.id == c.id),
            "Commission {} is in both unpaid and paid",
            c.id
        );
    }
    for c in &buckets.paid {
        assert!(c.is_paid(), "Commission {} in paid bucket is not paid", c.id);
    }
    for c in &buckets.scheduled {
        assert!(
            buckets.paid.iter().any(|p| p.id == c.id),
            "Scheduled commission {} missing from paid bucket",
            c.id
        );
    }
}
