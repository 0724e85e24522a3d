//! CSV export of a commission bucket

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;

use crate::commission::Commission;
use crate::eligibility::payout_state;
use crate::error::CommissionError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    id: &'a str,
    agent_id: &'a str,
    member_id: &'a str,
    commission_type: &'static str,
    commission_amount: String,
    payment_status: &'a str,
    payout_state: &'static str,
    payment_captured: bool,
    eligible_for_payout_at: String,
    payment_date: String,
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

impl<'a> ExportRow<'a> {
    fn new(commission: &'a Commission, now: DateTime<Utc>) -> Self {
        Self {
            id: commission.id.as_str(),
            agent_id: commission.agent_id.as_str(),
            member_id: commission.member_id.as_ref().map_or("", |m| m.as_str()),
            commission_type: commission.commission_type.as_str(),
            commission_amount: commission.commission_amount.to_string(),
            payment_status: commission.payment_status.as_str(),
            payout_state: payout_state(commission, now).as_str(),
            payment_captured: commission.payment_captured,
            eligible_for_payout_at: timestamp(commission.eligible_for_payout_at),
            payment_date: timestamp(commission.payment_date),
        }
    }
}

/// Writes one CSV row per commission, with a header row
///
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(writer: W, bucket: &[&Commission], now: DateTime<Utc>) -> Result<usize, CommissionError> {
    let mut csv = csv::Writer::from_writer(writer);
    if bucket.is_empty() {
        // serde-driven headers are only emitted with the first record
        csv.write_record([
            "id",
            "agentId",
            "memberId",
            "commissionType",
            "commissionAmount",
            "paymentStatus",
            "payoutState",
            "paymentCaptured",
            "eligibleForPayoutAt",
            "paymentDate",
        ])?;
    }
    for commission in bucket {
        csv.serialize(ExportRow::new(commission, now))?;
    }
    csv.flush().map_err(|e| CommissionError::Export(e.to_string()))?;
    Ok(bucket.len())
}
