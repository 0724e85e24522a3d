//! HTTP API Layer
//!
//! This crate provides the REST API of the commission payout desk using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Commission listing, export, batch payout and health
//! - **Middleware**: Authentication, request ids, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(service, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{CoreError, Currency, Timezone};
use domain_commission::CommissionService;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{commissions, health};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CommissionService>,
    pub config: ApiConfig,
    /// Viewer timezone, resolved once from the config
    pub timezone: Timezone,
    pub currency: Currency,
}

impl AppState {
    /// Resolves the configured timezone and currency
    pub fn new(service: Arc<CommissionService>, config: ApiConfig) -> Result<Self, CoreError> {
        let timezone = config.viewer_timezone()?;
        let currency = config.report_currency()?;
        Ok(Self {
            service,
            config,
            timezone,
            currency,
        })
    }
}

/// Creates the main API router
///
/// Health routes are public; everything under `/api/v1` requires a bearer
/// token. Every response carries an `x-request-id`.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let commission_routes = Router::new()
        .route("/", get(commissions::list_commissions))
        .route("/agents", get(commissions::agent_summaries))
        .route("/export", get(commissions::export_commissions))
        .route("/batch/preview", post(commissions::preview_batch))
        .route("/batch/mark-paid", post(commissions::mark_paid))
        .route("/invalidate", post(commissions::invalidate));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/commissions", commission_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
