//! # Web API Middleware
//!
//! Middleware stack for the web API: CORS, request timeout, and request
//! tracing.

use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

/// Apply the production middleware stack for a router with app state
///
/// Applies middleware in the correct order for production deployment:
/// 1. Request timeout
/// 2. CORS handling
/// 3. Request tracing
pub fn apply_middleware_stack(
    router: Router<AppState>,
    request_timeout: Duration,
) -> Router<AppState> {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Create CORS layer with appropriate settings
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
