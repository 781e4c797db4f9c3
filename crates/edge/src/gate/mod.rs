//! Request gate
//!
//! Runs once per storefront request, before it reaches the storefront:
//! 1. Loopback request to a non-root path without `?org=` -> 400 page
//! 2. No tenant derivable -> 404 page (dev) or redirect to the marketing site
//! 3. Tenant validation -> 500 page or `/error`, 404 page or `/not-found`,
//!    or continue with the tenant attached to the request
//! 4. Dashboard path without a session -> redirect to login
//! 5. Otherwise continue

mod middleware;
mod pages;
mod paths;

pub use middleware::{tenant_gate, TENANT_HEADERS};
pub use pages::{redirect, DiagnosticPage};
pub use paths::GatePaths;

use axum::http::{header, HeaderMap, Uri};
use std::sync::Arc;
use storely_shared::TenantInfo;
use tracing::{debug, error, info};

use crate::config::Environment;
use crate::routing::{is_loopback_host, normalize_host, org_param, TenantResolver};
use crate::session::SessionAuthenticator;
use crate::validation::OrganizationValidator;

/// Redirect target for tenants the organization service rejected
pub const NOT_FOUND_PATH: &str = "/not-found";
/// Redirect target when validation could not run
pub const ERROR_PATH: &str = "/error";

/// Outcome of gating a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Hand the request on; carries the validated tenant when one was resolved
    Continue(Option<TenantInfo>),
    /// Answer with a temporary redirect to this location
    Redirect(String),
    /// Answer with a development diagnostic page
    Diagnostic(DiagnosticPage),
}

/// Tenant resolution, validation and dashboard authorization for one
/// storefront deployment
pub struct TenantGate {
    environment: Environment,
    resolver: TenantResolver,
    validator: Arc<dyn OrganizationValidator>,
    sessions: SessionAuthenticator,
    paths: GatePaths,
    root_domain_url: String,
}

impl TenantGate {
    pub fn new(
        environment: Environment,
        validator: Arc<dyn OrganizationValidator>,
        sessions: SessionAuthenticator,
        paths: GatePaths,
        root_domain_url: &str,
    ) -> Self {
        Self {
            environment,
            resolver: TenantResolver::new(environment.is_development()),
            validator,
            sessions,
            paths,
            root_domain_url: root_domain_url.to_string(),
        }
    }

    /// Decide what happens to a request
    pub async fn evaluate(&self, uri: &Uri, headers: &HeaderMap) -> GateDecision {
        let path = uri.path();
        if !self.paths.is_gated(path) {
            return GateDecision::Continue(None);
        }

        let host = request_host(uri, headers);
        let query = uri.query();
        let diagnostics =
            self.environment.is_development() && is_loopback_host(&normalize_host(&host));

        if diagnostics && path != "/" && org_param(query).is_none() {
            debug!(host = %host, path = %path, "Loopback request without org parameter");
            return GateDecision::Diagnostic(DiagnosticPage::MissingOrgParam {
                host,
                path: path.to_string(),
            });
        }

        let tenant = self.resolver.resolve(&host, query);
        if !tenant.is_valid {
            info!(host = %host, "No tenant for host");
            return if diagnostics {
                GateDecision::Diagnostic(DiagnosticPage::TenantNotFound { host, tenant })
            } else {
                GateDecision::Redirect(self.root_domain_url.clone())
            };
        }

        let mut validated = None;
        if tenant.needs_validation() {
            match self.validator.validate(&tenant).await {
                Err(e) => {
                    error!(host = %host, error = %e, "Tenant validation error");
                    return if diagnostics {
                        GateDecision::Diagnostic(DiagnosticPage::ValidationFailed {
                            host,
                            message: e.to_string(),
                        })
                    } else {
                        GateDecision::Redirect(ERROR_PATH.to_string())
                    };
                }
                Ok(tenant) if !tenant.is_valid => {
                    info!(
                        host = %host,
                        subdomain = %tenant.subdomain,
                        custom_domain = ?tenant.custom_domain,
                        "Tenant rejected by organization service"
                    );
                    return if diagnostics {
                        GateDecision::Diagnostic(DiagnosticPage::TenantNotFound { host, tenant })
                    } else {
                        GateDecision::Redirect(NOT_FOUND_PATH.to_string())
                    };
                }
                Ok(tenant) => validated = Some(tenant),
            }
        }

        // Dashboard routes live inside a tenant, so this runs after validation
        if self.paths.is_dashboard(path) && !self.sessions.has_session(headers) {
            debug!(path = %path, "Dashboard request without session");
            return GateDecision::Redirect(self.paths.login_redirect(path));
        }

        GateDecision::Continue(validated)
    }
}

/// Host the request was addressed to: the Host header, or the URI authority
/// for HTTP/2 requests that omit it
pub fn request_host(uri: &Uri, headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}
