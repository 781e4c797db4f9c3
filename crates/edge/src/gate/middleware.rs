//! Axum middleware wrapping the tenant gate

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use storely_shared::TenantInfo;

use super::{redirect, GateDecision};
use crate::state::AppState;

const ORGANIZATION_ID_HEADER: HeaderName = HeaderName::from_static("x-organization-id");
const TENANT_SUBDOMAIN_HEADER: HeaderName = HeaderName::from_static("x-tenant-subdomain");
const DEBUG_TENANT_HEADER: HeaderName = HeaderName::from_static("x-debug-tenant");

/// Headers only the gate may set
pub const TENANT_HEADERS: [HeaderName; 3] = [
    ORGANIZATION_ID_HEADER,
    TENANT_SUBDOMAIN_HEADER,
    DEBUG_TENANT_HEADER,
];

/// Middleware that resolves and validates the tenant of every storefront
/// request before it reaches the upstream
pub async fn tenant_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    // Clients must not be able to pick a tenant by sending the headers themselves
    for name in &TENANT_HEADERS {
        parts.headers.remove(name);
    }

    let decision = state.gate.evaluate(&parts.uri, &parts.headers).await;

    match decision {
        GateDecision::Continue(None) => next.run(Request::from_parts(parts, body)).await,
        GateDecision::Continue(Some(tenant)) => {
            annotate(&mut parts.headers, &tenant);
            let mut response = next.run(Request::from_parts(parts, body)).await;
            annotate(response.headers_mut(), &tenant);
            response
        }
        GateDecision::Redirect(location) => redirect(&location),
        GateDecision::Diagnostic(page) => page.into_response(),
    }
}

/// Attach the resolved tenant as headers
fn annotate(headers: &mut HeaderMap, tenant: &TenantInfo) {
    insert(headers, ORGANIZATION_ID_HEADER, &tenant.organization_id);
    insert(headers, TENANT_SUBDOMAIN_HEADER, &tenant.subdomain);
    match serde_json::to_string(tenant) {
        Ok(json) => insert(headers, DEBUG_TENANT_HEADER, &json),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize tenant debug header"),
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Tenant header value is not a valid header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate() {
        let mut headers = HeaderMap::new();
        let tenant = TenantInfo::from_subdomain("acme").confirmed("org_1");

        annotate(&mut headers, &tenant);

        assert_eq!(headers.get("x-organization-id").unwrap(), "org_1");
        assert_eq!(headers.get("x-tenant-subdomain").unwrap(), "acme");
        let debug: TenantInfo =
            serde_json::from_str(headers.get("x-debug-tenant").unwrap().to_str().unwrap())
                .unwrap();
        assert_eq!(debug, tenant);
    }

    #[test]
    fn test_annotate_skips_invalid_values() {
        let mut headers = HeaderMap::new();
        let tenant = TenantInfo::from_subdomain("bad\nvalue").confirmed("org_1");

        annotate(&mut headers, &tenant);

        assert_eq!(headers.get("x-organization-id").unwrap(), "org_1");
        assert!(headers.get("x-tenant-subdomain").is_none());
        // serde_json escapes the newline, so the debug header survives
        assert!(headers.get("x-debug-tenant").is_some());
    }
}
