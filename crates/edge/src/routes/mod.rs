//! HTTP routes

pub mod health;

use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::{gate::tenant_gate, proxy, state::AppState};

/// Create the edge router: health checks, and everything else gated and
/// forwarded to the storefront
pub fn create_router(state: AppState) -> Router {
    // Health check routes (the gate leaves /health alone)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(health_routes)
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(state.clone(), tenant_gate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
