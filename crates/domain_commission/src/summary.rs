//! Bucket totals and per-agent summaries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use core_kernel::{AgentId, CommissionId, Currency, Money};

use crate::classifier::Classification;
use crate::commission::{Commission, CommissionType};
use crate::eligibility::{payout_state, PayoutState};

/// Count and total of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketTotal {
    pub count: usize,
    pub total: Money,
}

impl BucketTotal {
    fn of(bucket: &[&Commission], currency: Currency) -> Self {
        Self {
            count: bucket.len(),
            total: Money::sum_amounts(bucket.iter().map(|c| c.commission_amount), currency),
        }
    }
}

/// Headline figures shown above the commission tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoutSummary {
    pub unpaid: BucketTotal,
    pub paid: BucketTotal,
    pub scheduled: BucketTotal,
}

impl PayoutSummary {
    pub fn from_classification(classification: &Classification<'_>, currency: Currency) -> Self {
        Self {
            unpaid: BucketTotal::of(&classification.unpaid, currency),
            paid: BucketTotal::of(&classification.paid, currency),
            scheduled: BucketTotal::of(&classification.scheduled, currency),
        }
    }
}

/// Total of the currently selected rows
///
/// Unknown ids contribute nothing, matching `select_payable_batch`.
pub fn selected_total(commissions: &[Commission], selected_ids: &[CommissionId], currency: Currency) -> Money {
    let wanted: BTreeSet<&str> = selected_ids.iter().map(CommissionId::as_str).collect();
    Money::sum_amounts(
        commissions
            .iter()
            .filter(|c| wanted.contains(c.id.as_str()))
            .map(|c| c.commission_amount),
        currency,
    )
}

/// Commission tracking figures for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCommissionSummary {
    pub agent_id: AgentId,
    pub commission_count: usize,
    pub direct_total: Decimal,
    pub override_total: Decimal,
    pub eligible_total: Decimal,
    pub paid_total: Decimal,
    /// Unpaid but not yet payable
    pub locked_total: Decimal,
}

impl AgentCommissionSummary {
    fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            commission_count: 0,
            direct_total: Decimal::ZERO,
            override_total: Decimal::ZERO,
            eligible_total: Decimal::ZERO,
            paid_total: Decimal::ZERO,
            locked_total: Decimal::ZERO,
        }
    }

    fn add(&mut self, commission: &Commission, now: DateTime<Utc>) {
        let amount = commission.commission_amount;
        self.commission_count += 1;

        match commission.commission_type {
            CommissionType::Direct => self.direct_total = self.direct_total.saturating_add(amount),
            CommissionType::Override => self.override_total = self.override_total.saturating_add(amount),
        }

        match payout_state(commission, now) {
            PayoutState::UnpaidEligible => self.eligible_total = self.eligible_total.saturating_add(amount),
            PayoutState::UnpaidLocked(_) => self.locked_total = self.locked_total.saturating_add(amount),
            PayoutState::PaidScheduled | PayoutState::PaidSettled => {
                self.paid_total = self.paid_total.saturating_add(amount)
            }
            PayoutState::Unclassified => {}
        }
    }
}

/// Groups commissions by agent, ordered by agent id
pub fn summarize_by_agent(commissions: &[Commission], now: DateTime<Utc>) -> Vec<AgentCommissionSummary> {
    let mut by_agent: BTreeMap<&AgentId, AgentCommissionSummary> = BTreeMap::new();
    for commission in commissions {
        by_agent
            .entry(&commission.agent_id)
            .or_insert_with(|| AgentCommissionSummary::new(commission.agent_id.clone()))
            .add(commission, now);
    }
    by_agent.into_values().collect()
}
