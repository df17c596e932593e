//! HTTP server for health and metrics endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use eyre::eyre;
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::types::ChainRole;

/// Relay statistics shared between the watch loop and the HTTP server
#[derive(Debug, Clone)]
pub struct WardenStats {
    /// Origin role this process scans
    pub role: ChainRole,
    /// Passes completed since startup
    pub passes_completed: u64,
    /// Events relayed across all passes
    pub events_relayed: u64,
    /// Events skipped as already relayed
    pub events_skipped: u64,
    /// Events that failed submission
    pub events_failed: u64,
    /// Upper bound of the most recent scan window
    pub last_scanned_block: u64,
}

impl WardenStats {
    pub fn new(role: ChainRole) -> Self {
        Self {
            role,
            passes_completed: 0,
            events_relayed: 0,
            events_skipped: 0,
            events_failed: 0,
            last_scanned_block: 0,
        }
    }
}

/// Shared state for the HTTP server
pub type SharedStats = Arc<RwLock<WardenStats>>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub role: ChainRole,
    pub passes_completed: u64,
    pub events_relayed: u64,
    pub events_skipped: u64,
    pub events_failed: u64,
    pub last_scanned_block: u64,
}

/// Health check endpoint handler
async fn health_check(State(stats): State<SharedStats>) -> Json<HealthResponse> {
    let stats = stats.read().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        role: stats.role,
        passes_completed: stats.passes_completed,
        events_relayed: stats.events_relayed,
        events_skipped: stats.events_skipped,
        events_failed: stats.events_failed,
        last_scanned_block: stats.last_scanned_block,
    })
}

/// Liveness probe (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Readiness probe (checks if at least one pass has completed)
async fn readiness(State(stats): State<SharedStats>) -> &'static str {
    let stats = stats.read().await;
    if stats.passes_completed > 0 {
        "OK"
    } else {
        "NOT_READY"
    }
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    match Response::builder()
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(axum::body::Body::from(buffer))
    {
        Ok(resp) => resp,
        Err(_) => (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build metrics response",
        )
            .into_response(),
    }
}

/// Start the HTTP server for health and metrics
pub async fn start_server(metrics_addr: &str, stats: SharedStats) -> eyre::Result<()> {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/readyz", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(stats);

    let addr: SocketAddr = metrics_addr
        .parse()
        .map_err(|e| eyre!("Invalid metrics address {}: {}", metrics_addr, e))?;
    info!("Status server listening on {}", addr);
    info!("  /health  - Relay status (JSON)");
    info!("  /metrics - Prometheus metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
