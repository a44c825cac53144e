//! # Health Check Handlers
//!
//! Status surface for the resilience core: a degradation-aware health
//! endpoint and an operator-facing reconnection trigger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::web::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: String,
    offline_mode_enabled: bool,
    timestamp: String,
}

/// Reconnection attempt response
#[derive(Serialize)]
pub struct ReconnectResponse {
    success: bool,
    message: String,
    timestamp: String,
}

/// Health check endpoint: GET /health
///
/// Reports the cached primary-store verdict. Returns 200 while healthy and
/// 503 while degraded - but always answers, even in offline mode.
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Performing health check");

    let healthy = state.executor.is_healthy().await;

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        database: if healthy { "online" } else { "offline" }.to_string(),
        offline_mode_enabled: !healthy,
        timestamp: Utc::now().to_rfc3339(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Operator-facing reconnection trigger: POST /health/reconnect
///
/// Forces an immediate reconnection attempt instead of waiting for the next
/// scheduled one, and reports whether the primary store came back.
pub async fn force_reconnect(State(state): State<AppState>) -> Json<ReconnectResponse> {
    let success = state.coordinator.try_reconnect().await;

    Json(ReconnectResponse {
        success,
        message: if success {
            "Primary store reconnected successfully"
        } else {
            "Reconnection failed"
        }
        .to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
