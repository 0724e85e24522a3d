//! Commission handlers
//!
//! Every handler works on a cached snapshot from `CommissionService` and
//! classifies it at request time. Agent tokens are pinned to their own
//! `agentId`; any agent filter in the request is ignored for them.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use tracing::info;
use validator::Validate;

use core_kernel::{AgentId, DateRange, OperationMetadata};
use domain_commission::{
    current_week, parse_payment_date, payout_state, prepare_mark_paid, selected_total,
    summarize_by_agent, write_csv, AgentCommissionSummary, Commission, CommissionFilter,
    CommissionQuery, PayoutState, PayoutSummary,
};

use crate::auth::Claims;
use crate::dto::commission::*;
use crate::middleware::REQUEST_ID_HEADER;
use crate::{error::ApiError, AppState};

/// Lists the classified commissions for a date range
pub async fn list_commissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Query(params): Query<CommissionListParams>,
) -> Result<Json<CommissionListResponse>, ApiError> {
    let now = Utc::now();
    let query = resolve_query(&state, &claims, params.start_date, params.end_date, params.agent_id.as_deref(), now)?;
    let snapshot = state.service.snapshot(&query, Some(metadata(&headers, &claims))).await?;

    let filter = CommissionFilter {
        commission_type: params.commission_type,
        ..Default::default()
    };
    let visible = filter.apply(&snapshot.commissions, &state.timezone);
    let buckets = domain_commission::classify(visible.iter().copied(), now, &state.timezone);
    let locked: Vec<&Commission> = visible
        .iter()
        .copied()
        .filter(|c| matches!(payout_state(c, now), PayoutState::UnpaidLocked(_)))
        .collect();

    Ok(Json(CommissionListResponse {
        date_range: query.date_range,
        agent_id: query.agent_id.clone(),
        summary: PayoutSummary::from_classification(&buckets, state.currency),
        unpaid: CommissionView::all(&buckets.unpaid, now),
        paid: CommissionView::all(&buckets.paid, now),
        scheduled: CommissionView::all(&buckets.scheduled, now),
        locked: CommissionView::all(&locked, now),
        rejected_records: snapshot.rejected.len(),
        fetched_at: snapshot.fetched_at,
    }))
}

/// Per-agent commission tracking (admin)
pub async fn agent_summaries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Query(params): Query<CommissionListParams>,
) -> Result<Json<Vec<AgentCommissionSummary>>, ApiError> {
    require_admin(&claims)?;
    let now = Utc::now();
    let query = resolve_query(&state, &claims, params.start_date, params.end_date, params.agent_id.as_deref(), now)?;
    let snapshot = state.service.snapshot(&query, Some(metadata(&headers, &claims))).await?;

    Ok(Json(summarize_by_agent(&snapshot.commissions, now)))
}

/// Exports one bucket as CSV
pub async fn export_commissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let bucket = params.bucket;
    let params = params.list_params();
    let query = resolve_query(&state, &claims, params.start_date, params.end_date, params.agent_id.as_deref(), now)?;
    let snapshot = state.service.snapshot(&query, Some(metadata(&headers, &claims))).await?;

    let filter = CommissionFilter {
        commission_type: params.commission_type,
        ..Default::default()
    };
    let visible = filter.apply(&snapshot.commissions, &state.timezone);
    let buckets = domain_commission::classify(visible.iter().copied(), now, &state.timezone);
    let rows = match bucket {
        ExportBucket::Unpaid => &buckets.unpaid,
        ExportBucket::Paid => &buckets.paid,
        ExportBucket::Scheduled => &buckets.scheduled,
    };

    let mut body = Vec::new();
    write_csv(&mut body, rows, now)?;

    let filename = format!(
        "attachment; filename=\"commissions-{}-{}_{}.csv\"",
        bucket.as_str(),
        query.date_range.start,
        query.date_range.end
    );
    let disposition = HeaderValue::from_str(&filename).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Shows what a mark-as-paid submission would do
pub async fn preview_batch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchPreviewResponse>, ApiError> {
    request.validate()?;
    let now = Utc::now();
    let payment_date = parse_payment_date(&request.payment_date)?;
    let query = resolve_query(&state, &claims, request.start_date, request.end_date, request.agent_id.as_deref(), now)?;
    let snapshot = state.service.snapshot(&query, Some(metadata(&headers, &claims))).await?;

    let selected = selected_total(&snapshot.commissions, &request.commission_ids, state.currency);
    let plan = prepare_mark_paid(&snapshot.commissions, &request.commission_ids, payment_date, now)?;

    Ok(Json(BatchPreviewResponse {
        selected_total: selected,
        payable_total: core_kernel::Money::new(plan.total, state.currency),
        commission_ids: plan.request.commission_ids,
        payment_date,
        skipped: plan.skipped,
    }))
}

/// Submits a batch mark-as-paid to the backend (admin)
pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(request): Json<BatchRequest>,
) -> Result<Json<MarkPaidResponse>, ApiError> {
    require_admin(&claims)?;
    request.validate()?;
    let now = Utc::now();
    let payment_date = parse_payment_date(&request.payment_date)?;
    let query = resolve_query(&state, &claims, request.start_date, request.end_date, request.agent_id.as_deref(), now)?;

    let metadata = metadata(&headers, &claims)
        .with_context("batch_size", request.commission_ids.len().to_string());
    let outcome = state
        .service
        .mark_paid(&query, &request.commission_ids, payment_date, now, Some(metadata))
        .await?;

    Ok(Json(MarkPaidResponse {
        submitted: outcome.plan.request.commission_ids.len(),
        updated: outcome.receipt.updated,
        total: outcome.plan.total,
        payment_date,
        skipped: outcome.plan.skipped,
    }))
}

/// Drops cached snapshots after a backend-side change (admin)
pub async fn invalidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    request: Option<Json<InvalidateRequest>>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    require_admin(&claims)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let dropped = match &request.agent_id {
        Some(agent_id) => state.service.invalidate_agent(agent_id).await,
        None => state.service.invalidate_all().await,
    };
    info!(user = %claims.sub, dropped, "Commission cache invalidated");

    Ok(Json(InvalidateResponse { dropped }))
}

fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin role required".to_string()))
    }
}

/// Builds the backend query for a request
///
/// Without dates the viewer's current week is used; a single date is rejected.
fn resolve_query(
    state: &AppState,
    claims: &Claims,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
    requested_agent: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CommissionQuery, ApiError> {
    let scope = claims
        .agent_scope()
        .map_err(|e| ApiError::Forbidden(e.to_string()))?;

    let date_range = match (start, end) {
        (None, None) => current_week(state.timezone.local_date(now)),
        (Some(start), Some(end)) => DateRange::new(start, end).map_err(|e| ApiError::BadRequest(e.to_string()))?,
        _ => {
            return Err(ApiError::BadRequest(
                "startDate and endDate must be given together".to_string(),
            ))
        }
    };

    let requested = requested_agent
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(AgentId::new);

    Ok(CommissionQuery {
        date_range,
        agent_id: scope.or(requested),
    })
}

fn metadata(headers: &HeaderMap, claims: &Claims) -> OperationMetadata {
    let metadata = match headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(id) => OperationMetadata::with_correlation_id(id),
        None => OperationMetadata::default(),
    };
    metadata.initiated_by(claims.sub.clone())
}
