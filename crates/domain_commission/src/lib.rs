//! Commission Domain - Payout eligibility and classification
//!
//! This crate decides which agent commissions can be paid out and prepares
//! the batch mark-as-paid mutation, including:
//! - Intake of backend commission payloads into typed records
//! - Payout eligibility and derived payout state
//! - Classification into unpaid, paid and scheduled buckets
//! - Selection, totals, per-agent summaries and CSV export
//! - A cached snapshot service over the commissions backend port
//!
//! Eligibility compares absolute instants. Only "today" (for the scheduled
//! bucket) and date-range filters depend on the viewer's timezone.

pub mod commission;
pub mod eligibility;
pub mod classifier;
pub mod intake;
pub mod selection;
pub mod batch;
pub mod summary;
pub mod filter;
pub mod export;
pub mod ports;
pub mod services;
pub mod error;

pub use commission::{Commission, CommissionType, PaymentStatus};
pub use eligibility::{
    is_eligible_for_payout, payout_state, days_until_eligible, holding_period_end,
    LockReason, PayoutState, HOLDING_PERIOD_DAYS,
};
pub use classifier::{classify, is_scheduled, total, Classification};
pub use intake::{parse_commissions, IntakeMode, IntakeReport, RejectReason, RejectedRecord};
pub use selection::{select_payable_batch, Selection};
pub use batch::{
    parse_payment_date, prepare_mark_paid, BatchPlan, MarkPaidReceipt, MarkPaidRequest,
    SkipReason, SkippedCommission,
};
pub use summary::{selected_total, summarize_by_agent, AgentCommissionSummary, BucketTotal, PayoutSummary};
pub use filter::{current_week, CommissionFilter};
pub use export::write_csv;
pub use ports::{CommissionPort, CommissionQuery};
pub use services::{CommissionService, CommissionSnapshot, MarkPaidOutcome, ServiceSettings};
pub use error::CommissionError;
