//! # Web API
//!
//! REST surface over the resilience core: a degradation-aware health/status
//! endpoint, an operator-facing reconnection trigger, and tenant-scoped
//! business/product routes that demonstrate the primary/fallback caller
//! contract.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;

pub use state::AppState;

/// Build the API router with the full middleware stack applied.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health::get_health))
        .route("/health/reconnect", post(handlers::health::force_reconnect))
        .route(
            "/businesses",
            get(handlers::businesses::list_businesses).post(handlers::businesses::create_business),
        )
        .route(
            "/businesses/:business_id/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        );

    let request_timeout = Duration::from_secs(state.config.web.request_timeout_seconds);
    middleware::apply_middleware_stack(routes, request_timeout).with_state(state)
}
