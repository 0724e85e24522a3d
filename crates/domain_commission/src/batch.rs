//! Batch mark-as-paid preparation
//!
//! Turns the dashboard's selected ids into the single mutation request sent
//! to the backend. Only records eligible at `now` are submitted; everything
//! else is reported back so the operator can see why a row was left out.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use core_kernel::CommissionId;

use crate::commission::Commission;
use crate::eligibility::{payout_state, LockReason, PayoutState};
use crate::error::CommissionError;
use crate::selection::select_payable_batch;

/// Wire payload of the backend's batch mark-as-paid mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    pub commission_ids: Vec<CommissionId>,
    /// Serialized as `YYYY-MM-DD`
    pub payment_date: NaiveDate,
}

/// Backend acknowledgement of a mark-as-paid submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidReceipt {
    /// Rows the backend reports as updated, when it says
    pub updated: Option<u64>,
}

/// Why a selected id was left out of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// No commission with this id in the snapshot
    Unknown,
    AlreadyPaid,
    Locked(LockReason),
    /// Payment status not recognised
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCommission {
    pub id: CommissionId,
    pub reason: SkipReason,
}

/// A validated batch ready for submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub request: MarkPaidRequest,
    /// Sum of the commission amounts in `request`
    pub total: Decimal,
    pub skipped: Vec<SkippedCommission>,
}

/// Parses a `YYYY-MM-DD` payment date
pub fn parse_payment_date(raw: &str) -> Result<NaiveDate, CommissionError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CommissionError::InvalidPaymentDate(raw.to_string()))
}

/// Prepares the mark-as-paid batch for the selected ids
///
/// Duplicate ids are collapsed. Skipped ids keep the order they were selected
/// in; submitted ids follow snapshot order.
///
/// # Errors
///
/// Returns `CommissionError::EmptyBatch` when no selected commission is
/// eligible for payout at `now`.
pub fn prepare_mark_paid(
    commissions: &[Commission],
    selected_ids: &[CommissionId],
    payment_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<BatchPlan, CommissionError> {
    let mut seen = BTreeSet::new();
    let unique: Vec<CommissionId> = selected_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();

    let selected = select_payable_batch(commissions, &unique);
    let found: BTreeSet<&str> = selected.iter().map(|c| c.id.as_str()).collect();

    let mut skipped: Vec<SkippedCommission> = Vec::new();
    let mut payable: Vec<&Commission> = Vec::with_capacity(selected.len());

    for commission in selected {
        let reason = match payout_state(commission, now) {
            PayoutState::UnpaidEligible => {
                payable.push(commission);
                continue;
            }
            PayoutState::UnpaidLocked(lock) => SkipReason::Locked(lock),
            PayoutState::PaidScheduled | PayoutState::PaidSettled => SkipReason::AlreadyPaid,
            PayoutState::Unclassified => SkipReason::Unclassified,
        };
        skipped.push(SkippedCommission {
            id: commission.id.clone(),
            reason,
        });
    }

    let mut unknown: Vec<SkippedCommission> = unique
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .map(|id| SkippedCommission {
            id: id.clone(),
            reason: SkipReason::Unknown,
        })
        .collect();
    unknown.append(&mut skipped);
    let skipped = order_by_selection(unknown, &unique);

    if payable.is_empty() {
        return Err(CommissionError::EmptyBatch {
            skipped: skipped.len(),
        });
    }

    let total = crate::classifier::total(&payable);
    let request = MarkPaidRequest {
        commission_ids: payable.iter().map(|c| c.id.clone()).collect(),
        payment_date,
    };

    info!(
        batch_size = request.commission_ids.len(),
        skipped = skipped.len(),
        total = %total,
        payment_date = %payment_date,
        "Prepared mark-as-paid batch"
    );

    Ok(BatchPlan {
        request,
        total,
        skipped,
    })
}

fn order_by_selection(mut skipped: Vec<SkippedCommission>, order: &[CommissionId]) -> Vec<SkippedCommission> {
    skipped.sort_by_key(|s| order.iter().position(|id| *id == s.id));
    skipped
}
