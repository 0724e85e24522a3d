//! Client-side filtering of a fetched snapshot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, DateRange, Timezone};

use crate::commission::{Commission, CommissionType};

/// The Sunday-to-Saturday week containing `today`
pub fn current_week(today: NaiveDate) -> DateRange {
    DateRange::week_containing(today)
}

/// Filters applied to an already fetched snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionFilter {
    /// Matched against `createdAt` in the viewer's timezone
    pub date_range: Option<DateRange>,
    pub agent_id: Option<AgentId>,
    pub commission_type: Option<CommissionType>,
}

impl CommissionFilter {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_commission_type(mut self, commission_type: CommissionType) -> Self {
        self.commission_type = Some(commission_type);
        self
    }

    /// Returns true if the commission passes every set filter
    ///
    /// A commission without `createdAt` passes the date filter.
    pub fn matches(&self, commission: &Commission, tz: &Timezone) -> bool {
        if let Some(agent_id) = &self.agent_id {
            if commission.agent_id != *agent_id {
                return false;
            }
        }
        if let Some(commission_type) = self.commission_type {
            if commission.commission_type != commission_type {
                return false;
            }
        }
        match (self.date_range, commission.created_at) {
            (Some(range), Some(created_at)) => range.contains_instant(created_at, tz),
            _ => true,
        }
    }

    /// Borrows the commissions that pass the filter, keeping order
    pub fn apply<'a>(&self, commissions: &'a [Commission], tz: &Timezone) -> Vec<&'a Commission> {
        commissions.iter().filter(|c| self.matches(c, tz)).collect()
    }
}
