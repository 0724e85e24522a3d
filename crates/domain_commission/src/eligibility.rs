//! Payout eligibility
//!
//! A commission is eligible for payout when it is unpaid, the member's payment
//! has been captured, and its holding period (if any) has elapsed:
//!
//! ```text
//! paymentStatus == unpaid
//!   && paymentCaptured
//!   && (eligibleForPayoutAt is absent || eligibleForPayoutAt <= now)
//! ```
//!
//! The derived payout state of a single commission moves forward only:
//!
//! ```text
//! UnpaidLocked -> UnpaidEligible -> PaidScheduled -> PaidSettled
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::commission::{Commission, PaymentStatus};

/// Holding period the backend applies after payment capture
pub const HOLDING_PERIOD_DAYS: i64 = 14;

/// Returns true if the commission may be included in a payout batch at `now`
pub fn is_eligible_for_payout(commission: &Commission, now: DateTime<Utc>) -> bool {
    commission.payment_status == PaymentStatus::Unpaid
        && commission.payment_captured
        && commission
            .eligible_for_payout_at
            .map_or(true, |eligible_at| eligible_at <= now)
}

/// Why an unpaid commission cannot be paid yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum LockReason {
    /// The member's payment has not cleared the gateway
    PaymentNotCaptured,
    /// Captured, but the holding period ends at `eligible_at`
    HoldingPeriod {
        #[serde(rename = "eligibleAt")]
        eligible_at: DateTime<Utc>,
    },
}

/// Derived payout state of a single commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PayoutState {
    UnpaidLocked(LockReason),
    UnpaidEligible,
    /// Marked paid with a disbursement date after `now`
    PaidScheduled,
    PaidSettled,
    /// Payment status was not recognised; no transition applies
    Unclassified,
}

impl PayoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutState::UnpaidLocked(_) => "unpaid_locked",
            PayoutState::UnpaidEligible => "unpaid_eligible",
            PayoutState::PaidScheduled => "paid_scheduled",
            PayoutState::PaidSettled => "paid_settled",
            PayoutState::Unclassified => "unclassified",
        }
    }

    /// Returns true for states no dashboard action can move out of
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutState::PaidScheduled | PayoutState::PaidSettled)
    }
}

/// Computes the payout state of a commission at `now`
///
/// A paid commission without a payment date is treated as settled.
pub fn payout_state(commission: &Commission, now: DateTime<Utc>) -> PayoutState {
    match commission.payment_status {
        PaymentStatus::Paid => match commission.payment_date {
            Some(paid_on) if paid_on > now => PayoutState::PaidScheduled,
            _ => PayoutState::PaidSettled,
        },
        PaymentStatus::Unpaid => {
            if !commission.payment_captured {
                PayoutState::UnpaidLocked(LockReason::PaymentNotCaptured)
            } else {
                match commission.eligible_for_payout_at {
                    Some(eligible_at) if eligible_at > now => {
                        PayoutState::UnpaidLocked(LockReason::HoldingPeriod { eligible_at })
                    }
                    _ => PayoutState::UnpaidEligible,
                }
            }
        }
        PaymentStatus::Unrecognized(_) => PayoutState::Unclassified,
    }
}

/// End of the holding period for a payment captured at `captured_at`
pub fn holding_period_end(captured_at: DateTime<Utc>) -> DateTime<Utc> {
    captured_at + Duration::days(HOLDING_PERIOD_DAYS)
}

/// Whole days left before a captured commission leaves its holding period
///
/// Returns `None` when the commission is not waiting on the holding period.
/// A partial day counts as a full day.
pub fn days_until_eligible(commission: &Commission, now: DateTime<Utc>) -> Option<i64> {
    match payout_state(commission, now) {
        PayoutState::UnpaidLocked(LockReason::HoldingPeriod { eligible_at }) => {
            let remaining = eligible_at - now;
            let days = remaining.num_days();
            if remaining > Duration::days(days) {
                Some(days + 1)
            } else {
                Some(days)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::{AgentId, CommissionId};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
    }

    fn captured() -> Commission {
        let mut c = Commission::new(CommissionId::new("c1"), AgentId::new("a1"), dec!(40));
        c.payment_captured = true;
        c
    }

    #[test]
    fn test_eligible_after_holding_period() {
        let mut c = captured();
        c.eligible_for_payout_at = Some(now() - Duration::days(10));
        assert!(is_eligible_for_payout(&c, now()));
        assert_eq!(payout_state(&c, now()), PayoutState::UnpaidEligible);
    }

    #[test]
    fn test_not_eligible_during_holding_period() {
        let mut c = captured();
        let eligible_at = now() + Duration::days(2);
        c.eligible_for_payout_at = Some(eligible_at);
        assert!(!is_eligible_for_payout(&c, now()));
        assert_eq!(
            payout_state(&c, now()),
            PayoutState::UnpaidLocked(LockReason::HoldingPeriod { eligible_at })
        );
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut c = captured();
        c.eligible_for_payout_at = Some(now());
        assert!(is_eligible_for_payout(&c, now()));
    }

    #[test]
    fn test_absent_gate_means_no_gate() {
        let c = captured();
        assert!(is_eligible_for_payout(&c, now()));
    }

    #[test]
    fn test_uncaptured_never_eligible() {
        let mut c = captured();
        c.payment_captured = false;
        c.eligible_for_payout_at = Some(now() - Duration::days(30));
        assert!(!is_eligible_for_payout(&c, now()));
        assert_eq!(
            payout_state(&c, now()),
            PayoutState::UnpaidLocked(LockReason::PaymentNotCaptured)
        );
    }

    #[test]
    fn test_paid_states() {
        let mut c = captured();
        c.payment_status = PaymentStatus::Paid;
        c.payment_date = Some(now() + Duration::days(1));
        assert_eq!(payout_state(&c, now()), PayoutState::PaidScheduled);
        assert!(!is_eligible_for_payout(&c, now()));

        c.payment_date = Some(now() - Duration::days(1));
        assert_eq!(payout_state(&c, now()), PayoutState::PaidSettled);

        c.payment_date = None;
        assert_eq!(payout_state(&c, now()), PayoutState::PaidSettled);
        assert!(payout_state(&c, now()).is_terminal());
    }

    #[test]
    fn test_unrecognized_status() {
        let mut c = captured();
        c.payment_status = PaymentStatus::Unrecognized("void".to_string());
        assert!(!is_eligible_for_payout(&c, now()));
        assert_eq!(payout_state(&c, now()), PayoutState::Unclassified);
    }

    #[test]
    fn test_days_until_eligible_rounds_up() {
        let mut c = captured();
        c.eligible_for_payout_at = Some(now() + Duration::days(2) + Duration::hours(3));
        assert_eq!(days_until_eligible(&c, now()), Some(3));

        c.eligible_for_payout_at = Some(now() + Duration::days(2));
        assert_eq!(days_until_eligible(&c, now()), Some(2));

        c.eligible_for_payout_at = None;
        assert_eq!(days_until_eligible(&c, now()), None);
    }

    #[test]
    fn test_holding_period_end() {
        let captured_at = now();
        assert_eq!(holding_period_end(captured_at), now() + Duration::days(14));
    }
}
