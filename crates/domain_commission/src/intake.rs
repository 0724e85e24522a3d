//! Intake boundary for backend commission payloads
//!
//! Backend data quality is not guaranteed, so every payload passes through
//! this module exactly once before any rule sees it. Downstream code works on
//! typed [`Commission`] values and never re-checks shapes.
//!
//! Coercions applied per record:
//! - `commissionAmount`: JSON numbers and numeric strings are accepted;
//!   anything else (missing, `null`, `"abc"`) becomes zero
//! - optional timestamps: RFC 3339, naive date-times and plain dates are
//!   accepted, naive values being read as UTC; epoch milliseconds are
//!   accepted too; anything else becomes `None`
//! - booleans: only JSON `true` counts as true
//!
//! Records without an `id` or `agentId` cannot be paid or attributed and are
//! rejected individually; they never abort the whole payload.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

use core_kernel::{AgentId, CommissionId, MemberId};

use crate::commission::{Commission, CommissionType, PaymentStatus};
use crate::error::CommissionError;

/// Envelope keys under which backends commonly nest the record array
const ENVELOPE_KEYS: [&str; 2] = ["commissions", "data"];

/// How to treat a payload that is not an array of records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntakeMode {
    /// Treat a non-array payload as an empty snapshot
    #[default]
    Lenient,
    /// Reject a non-array payload
    Strict,
}

/// Why a single record was dropped at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    NotAnObject,
    MissingId,
    MissingAgentId,
}

/// A record dropped at intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    /// Position in the backend array
    pub index: usize,
    pub id: Option<String>,
    pub reason: RejectReason,
}

/// Result of parsing one backend payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeReport {
    pub commissions: Vec<Commission>,
    pub rejected: Vec<RejectedRecord>,
    /// Records whose amount was missing or non-numeric and read as zero
    pub coerced_amounts: usize,
    /// Records carrying a negative amount, kept as sent
    pub negative_amounts: usize,
}

/// Parses a backend payload into typed commissions
///
/// # Errors
///
/// Returns `CommissionError::MalformedPayload` only in strict mode, when the
/// payload is neither an array nor an envelope holding one.
pub fn parse_commissions(payload: &Value, mode: IntakeMode) -> Result<IntakeReport, CommissionError> {
    let records = match records(payload) {
        Some(records) => records,
        None => {
            let kind = json_kind(payload);
            return match mode {
                IntakeMode::Strict => Err(CommissionError::MalformedPayload(format!(
                    "expected an array of commissions, got {}",
                    kind
                ))),
                IntakeMode::Lenient => {
                    warn!(payload_kind = kind, "Commission payload is not an array; treating as empty");
                    Ok(IntakeReport::default())
                }
            };
        }
    };

    let mut report = IntakeReport {
        commissions: Vec::with_capacity(records.len()),
        ..Default::default()
    };

    for (index, record) in records.iter().enumerate() {
        match parse_record(index, record) {
            Ok((commission, amount_coerced)) => {
                if amount_coerced {
                    report.coerced_amounts += 1;
                }
                if commission.commission_amount < Decimal::ZERO {
                    report.negative_amounts += 1;
                }
                report.commissions.push(commission);
            }
            Err(rejected) => {
                warn!(
                    index = rejected.index,
                    id = rejected.id.as_deref().unwrap_or("-"),
                    reason = ?rejected.reason,
                    "Dropping commission record at intake"
                );
                report.rejected.push(rejected);
            }
        }
    }

    debug!(
        accepted = report.commissions.len(),
        rejected = report.rejected.len(),
        coerced_amounts = report.coerced_amounts,
        negative_amounts = report.negative_amounts,
        "Parsed commission payload"
    );

    Ok(report)
}

fn records(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(records) => Some(records),
        Value::Object(map) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_record(index: usize, record: &Value) -> Result<(Commission, bool), RejectedRecord> {
    let fields = record.as_object().ok_or(RejectedRecord {
        index,
        id: None,
        reason: RejectReason::NotAnObject,
    })?;

    let id = identifier(fields, "id").ok_or(RejectedRecord {
        index,
        id: None,
        reason: RejectReason::MissingId,
    })?;

    let agent_id = identifier(fields, "agentId").ok_or_else(|| RejectedRecord {
        index,
        id: Some(id.clone()),
        reason: RejectReason::MissingAgentId,
    })?;

    let (amount, amount_coerced) = amount(fields.get("commissionAmount"));
    if amount_coerced {
        warn!(commission_id = %id, "Non-numeric commissionAmount read as zero");
    } else if amount < Decimal::ZERO {
        warn!(commission_id = %id, %amount, "Negative commissionAmount; totals will be reduced by it");
    }

    let commission_type = match text(fields, "commissionType") {
        Some(raw) => CommissionType::parse(&raw).unwrap_or_else(|| {
            warn!(commission_id = %id, commission_type = %raw, "Unknown commissionType; treating as direct");
            CommissionType::Direct
        }),
        None => CommissionType::Direct,
    };

    let payment_status = PaymentStatus::from(text(fields, "paymentStatus").unwrap_or_default());

    let commission = Commission {
        id: CommissionId::new(id),
        agent_id: AgentId::new(agent_id),
        member_id: identifier(fields, "memberId").map(MemberId::new),
        commission_amount: amount,
        commission_type,
        status: text(fields, "status"),
        payment_status,
        payment_captured: flag(fields, "paymentCaptured"),
        eligible_for_payout_at: timestamp(fields, "eligibleForPayoutAt"),
        payment_date: timestamp(fields, "paymentDate"),
        is_clawed_back: flag(fields, "isClawedBack"),
        clawback_reason: text(fields, "clawbackReason"),
        created_at: timestamp(fields, "createdAt"),
    };

    Ok((commission, amount_coerced))
}

/// Reads an identifier that may be a string or a number
fn identifier(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Bool(true)))
}

/// Returns the amount and whether it had to be coerced to zero
fn amount(value: Option<&Value>) -> (Decimal, bool) {
    let parsed = match value {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        _ => None,
    };
    match parsed {
        Some(amount) => (amount, false),
        None => (Decimal::ZERO, true),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn timestamp(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let parsed = match fields.get(key)? {
        Value::Null => return None,
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    if parsed.is_none() {
        warn!(field = key, "Unparseable timestamp ignored");
    }
    parsed
}

/// Parses the timestamp formats seen from the backend
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn single(record: Value) -> IntakeReport {
        parse_commissions(&json!([record]), IntakeMode::Lenient).unwrap()
    }

    #[test]
    fn test_full_record() {
        let report = single(json!({
            "id": "cm-1",
            "agentId": "ag-1",
            "memberId": "mb-1",
            "commissionAmount": 125.5,
            "commissionType": "override",
            "status": "active",
            "paymentStatus": "unpaid",
            "paymentCaptured": true,
            "eligibleForPayoutAt": "2024-06-01T12:00:00Z",
            "paymentDate": null,
            "isClawedBack": false,
            "clawbackReason": null,
            "createdAt": "2024-05-18T09:30:00.000Z"
        }));

        assert!(report.rejected.is_empty());
        let c = &report.commissions[0];
        assert_eq!(c.id.as_str(), "cm-1");
        assert_eq!(c.member_id.as_ref().map(|m| m.as_str()), Some("mb-1"));
        assert_eq!(c.commission_amount, dec!(125.5));
        assert_eq!(c.commission_type, CommissionType::Override);
        assert_eq!(c.payment_status, PaymentStatus::Unpaid);
        assert!(c.payment_captured);
        assert_eq!(
            c.eligible_for_payout_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(c.payment_date, None);
        assert_eq!(c.status.as_deref(), Some("active"));
    }

    #[test]
    fn test_amount_coercion() {
        let report = parse_commissions(
            &json!([
                {"id": "a", "agentId": "x", "commissionAmount": "42.10"},
                {"id": "b", "agentId": "x", "commissionAmount": "abc"},
                {"id": "c", "agentId": "x", "commissionAmount": null},
                {"id": "d", "agentId": "x"},
                {"id": "e", "agentId": "x", "commissionAmount": 1e2}
            ]),
            IntakeMode::Lenient,
        )
        .unwrap();

        let amounts: Vec<Decimal> = report.commissions.iter().map(|c| c.commission_amount).collect();
        assert_eq!(amounts, vec![dec!(42.10), dec!(0), dec!(0), dec!(0), dec!(100)]);
        assert_eq!(report.coerced_amounts, 3);
    }

    #[test]
    fn test_negative_amounts_are_counted() {
        let report = parse_commissions(
            &json!([
                {"id": "a", "agentId": "x", "commissionAmount": "-50"},
                {"id": "b", "agentId": "x", "commissionAmount": -0.25},
                {"id": "c", "agentId": "x", "commissionAmount": "10"},
                {"id": "d", "agentId": "x", "commissionAmount": "-abc"}
            ]),
            IntakeMode::Lenient,
        )
        .unwrap();

        let amounts: Vec<Decimal> = report.commissions.iter().map(|c| c.commission_amount).collect();
        assert_eq!(amounts, vec![dec!(-50), dec!(-0.25), dec!(10), dec!(0)]);
        assert_eq!(report.negative_amounts, 2);
        assert_eq!(report.coerced_amounts, 1);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_non_array_lenient_is_empty() {
        let report = parse_commissions(&json!({"error": "nope"}), IntakeMode::Lenient).unwrap();
        assert!(report.commissions.is_empty());

        let report = parse_commissions(&Value::Null, IntakeMode::Lenient).unwrap();
        assert!(report.commissions.is_empty());
    }

    #[test]
    fn test_non_array_strict_is_rejected() {
        let err = parse_commissions(&json!("oops"), IntakeMode::Strict).unwrap_err();
        assert!(matches!(err, CommissionError::MalformedPayload(_)));
    }

    #[test]
    fn test_envelope_payload() {
        let report = parse_commissions(
            &json!({"data": [{"id": 7, "agentId": 3, "commissionAmount": 10}]}),
            IntakeMode::Strict,
        )
        .unwrap();
        assert_eq!(report.commissions[0].id.as_str(), "7");
        assert_eq!(report.commissions[0].agent_id.as_str(), "3");
    }

    #[test]
    fn test_rejects_records_without_identity() {
        let report = parse_commissions(
            &json!([
                42,
                {"agentId": "x"},
                {"id": "  ", "agentId": "x"},
                {"id": "orphan"},
                {"id": "ok", "agentId": "x"}
            ]),
            IntakeMode::Lenient,
        )
        .unwrap();

        let reasons: Vec<RejectReason> = report.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::NotAnObject,
                RejectReason::MissingId,
                RejectReason::MissingId,
                RejectReason::MissingAgentId
            ]
        );
        assert_eq!(report.rejected[3].id.as_deref(), Some("orphan"));
        assert_eq!(report.commissions.len(), 1);
    }

    #[test]
    fn test_missing_and_null_gate_are_identical() {
        let report = parse_commissions(
            &json!([
                {"id": "a", "agentId": "x", "eligibleForPayoutAt": null},
                {"id": "b", "agentId": "x"},
                {"id": "c", "agentId": "x", "eligibleForPayoutAt": "not a date"}
            ]),
            IntakeMode::Lenient,
        )
        .unwrap();

        assert!(report.commissions.iter().all(|c| c.eligible_for_payout_at.is_none()));
    }

    #[test]
    fn test_payment_captured_requires_true() {
        let report = parse_commissions(
            &json!([
                {"id": "a", "agentId": "x", "paymentCaptured": "true"},
                {"id": "b", "agentId": "x", "paymentCaptured": 1},
                {"id": "c", "agentId": "x", "paymentCaptured": true}
            ]),
            IntakeMode::Lenient,
        )
        .unwrap();

        let captured: Vec<bool> = report.commissions.iter().map(|c| c.payment_captured).collect();
        assert_eq!(captured, vec![false, false, true]);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-01"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-01 00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-31T20:00:00-04:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let report = single(json!({"id": "a", "agentId": "x", "paymentDate": 1_717_200_000_000i64}));
        assert_eq!(
            report.commissions[0].payment_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unknown_payment_status_is_kept() {
        let report = single(json!({"id": "a", "agentId": "x", "paymentStatus": "processing"}));
        assert_eq!(
            report.commissions[0].payment_status,
            PaymentStatus::Unrecognized("processing".to_string())
        );
    }
}
