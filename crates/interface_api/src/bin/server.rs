//! Commission Desk - API Server Binary
//!
//! This binary starts the HTTP API of the commission payout desk.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin commission-desk
//!
//! # Run against a specific backend
//! DESK_BACKEND_URL=https://crm.example.com/api DESK_TIMEZONE=America/Chicago cargo run --bin commission-desk
//! ```
//!
//! # Environment Variables
//!
//! * `DESK_HOST` - Server host (default: 0.0.0.0)
//! * `DESK_PORT` - Server port (default: 8080)
//! * `DESK_JWT_SECRET` - JWT signing secret (required in production)
//! * `DESK_BACKEND_URL` - Base URL of the commissions backend
//! * `DESK_BACKEND_API_KEY` - Bearer key for the backend
//! * `DESK_TIMEZONE` - Viewer timezone for "today" and date filters (default: UTC)
//! * `DESK_CURRENCY` - Reporting currency (default: USD)
//! * `DESK_CACHE_TTL_SECS` - Snapshot cache lifetime (default: 60)
//! * `DESK_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `DESK_LOG_FORMAT` - `text` or `json` (default: text)

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_commission::{CommissionService, ServiceSettings};
use infra_http::HttpCommissionAdapter;
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The backend adapter cannot be built
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;

    init_tracing(&config.log_level, config.json_logs());

    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = %config.backend_url,
        timezone = %config.timezone,
        "Starting Commission Desk API Server"
    );

    let adapter = HttpCommissionAdapter::new(config.backend()).context("building backend adapter")?;
    let settings = ServiceSettings {
        cache_ttl: config.cache_ttl(),
        ..Default::default()
    };
    let service = Arc::new(CommissionService::new(Arc::new(adapter), settings));

    let addr = config.server_addr();
    let state = AppState::new(service, config).context("resolving timezone and currency")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed that signal source is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
