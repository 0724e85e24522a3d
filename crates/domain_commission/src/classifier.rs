//! Commission classification into payout buckets
//!
//! The classifier is a pure function of `(commissions, now, timezone)`. It
//! borrows the caller's snapshot and never mutates it, so the same snapshot
//! can be classified repeatedly and from several tasks at once.
//!
//! Buckets:
//! - **unpaid**: every commission eligible for payout at `now`
//! - **paid**: every commission whose payment status is `paid`
//! - **scheduled**: the paid commissions dated today or later, where "today"
//!   is the viewer's local calendar day, inclusive at both ends

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::Timezone;

use crate::commission::Commission;
use crate::eligibility::is_eligible_for_payout;

/// The three payout buckets of a commission snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification<'a> {
    pub unpaid: Vec<&'a Commission>,
    pub paid: Vec<&'a Commission>,
    pub scheduled: Vec<&'a Commission>,
}

impl<'a> Classification<'a> {
    /// Total commission amount of the unpaid bucket
    pub fn unpaid_total(&self) -> Decimal {
        total(&self.unpaid)
    }

    /// Total commission amount of the paid bucket
    pub fn paid_total(&self) -> Decimal {
        total(&self.paid)
    }

    /// Total commission amount of the scheduled bucket
    pub fn scheduled_total(&self) -> Decimal {
        total(&self.scheduled)
    }
}

/// Returns true if a paid commission's payment date is today or later
pub fn is_scheduled(commission: &Commission, now: DateTime<Utc>, tz: &Timezone) -> bool {
    if !commission.is_paid() {
        return false;
    }
    let start_of_today = tz.start_of_day(tz.local_date(now));
    commission
        .payment_date
        .map_or(false, |paid_on| paid_on >= start_of_today)
}

/// Partitions commissions into payout buckets
///
/// Input order is preserved within each bucket.
pub fn classify<'a, I>(commissions: I, now: DateTime<Utc>, tz: &Timezone) -> Classification<'a>
where
    I: IntoIterator<Item = &'a Commission>,
{
    let mut classification = Classification::default();

    for commission in commissions {
        if is_eligible_for_payout(commission, now) {
            classification.unpaid.push(commission);
        } else if commission.is_paid() {
            classification.paid.push(commission);
            if is_scheduled(commission, now, tz) {
                classification.scheduled.push(commission);
            }
        }
    }

    classification
}

/// Sums the commission amounts of a bucket
///
/// Amounts are exact decimals, so the result does not depend on order.
pub fn total(bucket: &[&Commission]) -> Decimal {
    bucket
        .iter()
        .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.commission_amount))
}
