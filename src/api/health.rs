/// Health check endpoints
///
/// Liveness only says the process answers. Readiness also asks the Stacks
/// node for its tip height, since resolution is useless without it.
use crate::{context::AppContext, metrics, registry::RegistryClient};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok", "ready" or "unavailable"
    pub status: String,
    pub version: String,
    pub network: String,
    pub uptime_seconds: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_height: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_text))
}

/// Basic health check
pub async fn health_basic(State(ctx): State<AppContext>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: ctx.config.service.version.clone(),
        network: ctx.config.network.deployment.to_string(),
        uptime_seconds: ctx.uptime_seconds(),
        tip_height: None,
        error: None,
    })
}

/// Readiness probe
///
/// Returns 200 when the Stacks node answers, 503 otherwise.
pub async fn readiness_probe(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let start = Instant::now();
    let tip = ctx.resolver.client().fetch_current_block_height().await;

    let (status_code, status, tip_height, error) = match tip {
        Ok(height) => (StatusCode::OK, "ready", Some(height), None),
        Err(e) => {
            tracing::warn!(error = %e, "readiness_probe_failed: stacks node unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                None,
                Some(e.to_string()),
            )
        }
    };

    tracing::debug!(
        status,
        duration_ms = start.elapsed().as_millis() as u64,
        "readiness_check_completed"
    );

    let health = HealthStatus {
        status: status.to_string(),
        version: ctx.config.service.version.clone(),
        network: ctx.config.network.deployment.to_string(),
        uptime_seconds: ctx.uptime_seconds(),
        tip_height,
        error,
    };
    (status_code, Json(health))
}

/// Prometheus text exposition
pub async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}
