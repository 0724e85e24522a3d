//! Commission records
//!
//! A commission is owed to an agent for one enrollment or policy period. The
//! backend owns the record; this crate only reads it and prepares the batch
//! mark-as-paid mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{AgentId, CommissionId, MemberId};

/// Who the commission accrues to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    /// Accrues to the enrolling agent
    Direct,
    /// Accrues to an upstream agent in the hierarchy
    Override,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Direct => "direct",
            CommissionType::Override => "override",
        }
    }

    /// Parses the wire value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(CommissionType::Direct),
            "override" => Some(CommissionType::Override),
            _ => None,
        }
    }
}

impl fmt::Display for CommissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of a commission, independent of its lifecycle status
///
/// Values the backend sends that are neither `paid` nor `unpaid` are kept
/// verbatim so they can be reported, but they never count toward a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Unrecognized(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "unpaid" => PaymentStatus::Unpaid,
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Unrecognized(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commission record as delivered by the backend
///
/// Field names serialize in camelCase to match the backend's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub id: CommissionId,
    pub agent_id: AgentId,
    pub member_id: Option<MemberId>,
    pub commission_amount: Decimal,
    pub commission_type: CommissionType,
    /// Lifecycle tag, opaque to the payout rules
    pub status: Option<String>,
    pub payment_status: PaymentStatus,
    /// True once the member's payment cleared the gateway
    pub payment_captured: bool,
    /// End of the holding period; `None` means no gate beyond capture
    pub eligible_for_payout_at: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
    pub is_clawed_back: bool,
    pub clawback_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Commission {
    /// Creates an unpaid, uncaptured direct commission
    pub fn new(id: CommissionId, agent_id: AgentId, amount: Decimal) -> Self {
        Self {
            id,
            agent_id,
            member_id: None,
            commission_amount: amount,
            commission_type: CommissionType::Direct,
            status: None,
            payment_status: PaymentStatus::Unpaid,
            payment_captured: false,
            eligible_for_payout_at: None,
            payment_date: None,
            is_clawed_back: false,
            clawback_reason: None,
            created_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn is_unpaid(&self) -> bool {
        self.payment_status == PaymentStatus::Unpaid
    }
}
