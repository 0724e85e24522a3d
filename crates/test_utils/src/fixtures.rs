//! Pre-built Test Fixtures
//!
//! Provides a fixed reference clock and one commission per payout state.
//! Fixtures are consistent and predictable so assertions can use exact totals.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{DateRange, Timezone};
use domain_commission::Commission;

use crate::builders::CommissionBuilder;

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Reference clock: Wednesday 2024-06-12 15:00 UTC
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).single().unwrap_or_default()
    }

    pub fn today() -> NaiveDate {
        Self::now().date_naive()
    }

    /// Sunday-to-Saturday week around the reference clock
    pub fn week() -> DateRange {
        DateRange::week_containing(Self::today())
    }

    pub fn utc() -> Timezone {
        Timezone::default()
    }

    /// A timezone behind UTC, for "today" boundary tests
    pub fn new_york() -> Timezone {
        "America/New_York".parse().unwrap_or_default()
    }
}

/// One commission in each payout state, all for `agent-1` unless noted
pub struct CommissionFixtures;

impl CommissionFixtures {
    /// Captured, holding period ends in 3 days (locked)
    pub fn locked() -> Commission {
        CommissionBuilder::new("locked")
            .amount(dec!(40.00))
            .holding_for(TemporalFixtures::now(), 3)
            .build()
    }

    /// Payment never captured (locked)
    pub fn uncaptured() -> Commission {
        CommissionBuilder::new("uncaptured").amount(dec!(60.00)).build()
    }

    /// Captured, holding period ended yesterday
    pub fn eligible() -> Commission {
        CommissionBuilder::new("eligible")
            .amount(dec!(125.50))
            .holding_for(TemporalFixtures::now(), -1)
            .build()
    }

    /// Override commission for `agent-2`, captured with no holding period
    pub fn eligible_override() -> Commission {
        CommissionBuilder::new("override")
            .agent("agent-2")
            .amount(dec!(30.25))
            .override_commission()
            .captured()
            .build()
    }

    /// Paid with a disbursement date five days out
    pub fn scheduled() -> Commission {
        CommissionBuilder::new("scheduled")
            .amount(dec!(200.00))
            .paid_on(TemporalFixtures::now() + Duration::days(5))
            .build()
    }

    /// Paid last week
    pub fn settled() -> Commission {
        CommissionBuilder::new("settled")
            .amount(dec!(75.00))
            .paid_on(TemporalFixtures::now() - Duration::days(7))
            .build()
    }

    /// Payment status the backend should not send
    pub fn unrecognized() -> Commission {
        CommissionBuilder::new("pending")
            .amount(dec!(999.00))
            .captured()
            .payment_status("pending")
            .build()
    }

    /// Every fixture above, in a stable order
    pub fn snapshot() -> Vec<Commission> {
        vec![
            Self::locked(),
            Self::uncaptured(),
            Self::eligible(),
            Self::eligible_override(),
            Self::scheduled(),
            Self::settled(),
            Self::unrecognized(),
        ]
    }
}

/// Raw backend payloads, including the awkward shapes intake has to absorb
pub struct PayloadFixtures;

impl PayloadFixtures {
    /// `{ "commissions": [...] }` with every fixture commission
    pub fn snapshot() -> Value {
        crate::builders::envelope(
            CommissionFixtures::snapshot()
                .iter()
                .map(crate::builders::commission_json)
                .collect(),
        )
    }

    /// Records with numeric ids, string amounts and epoch-millis timestamps
    pub fn loosely_typed() -> Value {
        json!({
            "data": [
                {
                    "id": 101,
                    "agentId": 7,
                    "commissionAmount": "12.50",
                    "commissionType": "DIRECT",
                    "paymentStatus": "unpaid",
                    "paymentCaptured": true,
                    "eligibleForPayoutAt": 1717200000000i64
                },
                {
                    "id": "102",
                    "agentId": "7",
                    "commissionAmount": "not a number",
                    "paymentStatus": "PAID",
                    "paymentDate": "2024-06-01"
                },
                { "agentId": "7", "commissionAmount": 5 },
                "garbage"
            ]
        })
    }
}
