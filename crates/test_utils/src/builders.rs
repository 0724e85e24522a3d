//! Test Data Builders
//!
//! Provides a builder for commission records with sensible defaults, so tests
//! only spell out the fields that matter to them. The same builder renders
//! the backend's JSON shape for intake and mock-port tests.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use core_kernel::{AgentId, CommissionId, MemberId};
use domain_commission::{Commission, CommissionType, PaymentStatus};

use crate::fixtures::TemporalFixtures;

/// Builder for constructing test commissions
///
/// Defaults to an unpaid, uncaptured direct commission of 100.00 for
/// `agent-1`, created at the reference clock.
pub struct CommissionBuilder {
    commission: Commission,
}

impl Default for CommissionBuilder {
    fn default() -> Self {
        Self::new("commission-1")
    }
}

impl CommissionBuilder {
    /// Creates a new builder with default values
    pub fn new(id: impl Into<String>) -> Self {
        let mut commission = Commission::new(CommissionId::new(id), AgentId::new("agent-1"), dec!(100.00));
        commission.created_at = Some(TemporalFixtures::now());
        Self { commission }
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.commission.agent_id = AgentId::new(agent_id);
        self
    }

    pub fn member(mut self, member_id: impl Into<String>) -> Self {
        self.commission.member_id = Some(MemberId::new(member_id));
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.commission.commission_amount = amount;
        self
    }

    pub fn override_commission(mut self) -> Self {
        self.commission.commission_type = CommissionType::Override;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.commission.created_at = Some(at);
        self
    }

    /// Marks the member's payment as captured
    pub fn captured(mut self) -> Self {
        self.commission.payment_captured = true;
        self
    }

    pub fn eligible_at(mut self, at: DateTime<Utc>) -> Self {
        self.commission.eligible_for_payout_at = Some(at);
        self
    }

    /// Captured, with the holding period ending `days` after `now`
    ///
    /// Negative values put the end in the past.
    pub fn holding_for(self, now: DateTime<Utc>, days: i64) -> Self {
        self.captured().eligible_at(now + Duration::days(days))
    }

    /// Marks the commission paid on `date`
    pub fn paid_on(mut self, date: DateTime<Utc>) -> Self {
        self.commission.payment_captured = true;
        self.commission.payment_status = PaymentStatus::Paid;
        self.commission.payment_date = Some(date);
        self
    }

    /// Uses a payment status the classifier does not recognise
    pub fn payment_status(mut self, raw: impl Into<String>) -> Self {
        self.commission.payment_status = PaymentStatus::from(raw.into());
        self
    }

    pub fn clawed_back(mut self, reason: impl Into<String>) -> Self {
        self.commission.is_clawed_back = true;
        self.commission.clawback_reason = Some(reason.into());
        self
    }

    pub fn build(self) -> Commission {
        self.commission
    }

    /// The commission as the backend would send it
    pub fn to_json(self) -> Value {
        commission_json(&self.commission)
    }
}

/// Renders a commission in the backend's camelCase JSON shape
pub fn commission_json(commission: &Commission) -> Value {
    serde_json::to_value(commission).unwrap_or(Value::Null)
}

/// Wraps records in the `{ "commissions": [...] }` envelope
pub fn envelope(records: Vec<Value>) -> Value {
    serde_json::json!({ "commissions": records })
}
