//! Commission DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{AgentId, CommissionId, DateRange, Money};
use domain_commission::{
    days_until_eligible, payout_state, Commission, CommissionType, PayoutSummary, SkippedCommission,
};

/// Query string shared by the read endpoints
///
/// With neither date given, the viewer's current week is used.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionListParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_id: Option<String>,
    pub commission_type: Option<CommissionType>,
}

/// Bucket selector for CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportBucket {
    Unpaid,
    Paid,
    Scheduled,
}

impl ExportBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportBucket::Unpaid => "unpaid",
            ExportBucket::Paid => "paid",
            ExportBucket::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub bucket: ExportBucket,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_id: Option<String>,
    pub commission_type: Option<CommissionType>,
}

impl ExportParams {
    pub fn list_params(self) -> CommissionListParams {
        CommissionListParams {
            start_date: self.start_date,
            end_date: self.end_date,
            agent_id: self.agent_id,
            commission_type: self.commission_type,
        }
    }
}

/// Batch preview and mark-as-paid request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[validate(length(min = 1, max = 500, message = "select between 1 and 500 commissions"))]
    pub commission_ids: Vec<CommissionId>,
    /// `YYYY-MM-DD`
    #[validate(length(equal = 10, message = "must be YYYY-MM-DD"))]
    pub payment_date: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub agent_id: Option<String>,
}

/// Cache invalidation event
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    /// Drops only snapshots that may hold this agent's rows
    pub agent_id: Option<AgentId>,
}

/// One commission row with its derived payout state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionView {
    #[serde(flatten)]
    pub commission: Commission,
    pub payout_state: &'static str,
    pub days_until_eligible: Option<i64>,
}

impl CommissionView {
    pub fn new(commission: &Commission, now: DateTime<Utc>) -> Self {
        Self {
            commission: commission.clone(),
            payout_state: payout_state(commission, now).as_str(),
            days_until_eligible: days_until_eligible(commission, now),
        }
    }

    pub fn all(bucket: &[&Commission], now: DateTime<Utc>) -> Vec<Self> {
        bucket.iter().map(|c| Self::new(c, now)).collect()
    }
}

/// Classified view of one snapshot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionListResponse {
    pub date_range: DateRange,
    pub agent_id: Option<AgentId>,
    pub summary: PayoutSummary,
    pub unpaid: Vec<CommissionView>,
    pub paid: Vec<CommissionView>,
    pub scheduled: Vec<CommissionView>,
    /// Unpaid rows not yet payable
    pub locked: Vec<CommissionView>,
    /// Backend rows dropped at intake
    pub rejected_records: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPreviewResponse {
    pub selected_total: Money,
    pub payable_total: Money,
    pub commission_ids: Vec<CommissionId>,
    pub payment_date: NaiveDate,
    pub skipped: Vec<SkippedCommission>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidResponse {
    pub submitted: usize,
    /// Rows the backend reports as updated, when it says
    pub updated: Option<u64>,
    pub total: Decimal,
    pub payment_date: NaiveDate,
    pub skipped: Vec<SkippedCommission>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateResponse {
    pub dropped: usize,
}
