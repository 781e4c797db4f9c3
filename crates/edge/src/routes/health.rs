//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

impl Health {
    fn status_code(self) -> StatusCode {
        match self {
            Health::Healthy => StatusCode::OK,
            Health::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: Health,
    pub version: &'static str,
    pub upstream: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tenants: Option<usize>,
}

async fn upstream_health(state: &AppState) -> Health {
    if state.upstream.is_reachable().await {
        Health::Healthy
    } else {
        Health::Unhealthy
    }
}

/// Edge status plus storefront reachability
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    // The edge itself is only useful while the storefront answers
    let upstream = upstream_health(&state).await;

    (
        upstream.status_code(),
        Json(HealthResponse {
            status: upstream,
            version: env!("CARGO_PKG_VERSION"),
            upstream,
            cached_tenants: state
                .validation_cache
                .as_ref()
                .map(|cache| cache.stats().active_entries),
        }),
    )
}

/// Liveness probe
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: ready once the storefront answers
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    upstream_health(&state).await.status_code()
}
