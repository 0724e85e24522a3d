//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating commission snapshots around
//! the reference clock. Generated commissions cover every payout state.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_commission::Commission;

use crate::builders::CommissionBuilder;
use crate::fixtures::TemporalFixtures;

/// Strategy for commission amounts with cents, 0.00 to 99,999.99
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for instants within 60 days of the reference clock
pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (-60 * 24 * 60i64..60 * 24 * 60i64).prop_map(|minutes| TemporalFixtures::now() + Duration::minutes(minutes))
}

/// Strategy for the payment side of a commission
#[derive(Debug, Clone)]
pub enum PaymentShape {
    Unpaid {
        captured: bool,
        eligible_at: Option<DateTime<Utc>>,
    },
    Paid {
        payment_date: Option<DateTime<Utc>>,
    },
    Unrecognized,
}

pub fn payment_shape_strategy() -> impl Strategy<Value = PaymentShape> {
    prop_oneof![
        4 => (any::<bool>(), proptest::option::of(instant_strategy()))
            .prop_map(|(captured, eligible_at)| PaymentShape::Unpaid { captured, eligible_at }),
        3 => proptest::option::of(instant_strategy())
            .prop_map(|payment_date| PaymentShape::Paid { payment_date }),
        1 => Just(PaymentShape::Unrecognized),
    ]
}

/// Strategy for a single commission with the given id
pub fn commission_strategy(id: String) -> impl Strategy<Value = Commission> {
    (amount_strategy(), 1u8..4u8, any::<bool>(), payment_shape_strategy()).prop_map(
        move |(amount, agent, is_override, shape)| {
            let mut builder = CommissionBuilder::new(id.clone())
                .agent(format!("agent-{}", agent))
                .amount(amount);
            if is_override {
                builder = builder.override_commission();
            }
            match shape {
                PaymentShape::Unpaid { captured, eligible_at } => {
                    let builder = if captured { builder.captured() } else { builder };
                    let builder = match eligible_at {
                        Some(at) => builder.eligible_at(at),
                        None => builder,
                    };
                    builder.build()
                }
                PaymentShape::Paid { payment_date } => {
                    let mut c = builder.paid_on(TemporalFixtures::now()).build();
                    c.payment_date = payment_date;
                    c
                }
                PaymentShape::Unrecognized => builder.payment_status("pending").build(),
            }
        },
    )
}

/// Strategy for a snapshot of up to `max` commissions with unique ids
pub fn snapshot_strategy(max: usize) -> impl Strategy<Value = Vec<Commission>> {
    (0..=max).prop_flat_map(|len| {
        (0..len)
            .map(|i| commission_strategy(format!("c-{}", i)))
            .collect::<Vec<_>>()
    })
}
