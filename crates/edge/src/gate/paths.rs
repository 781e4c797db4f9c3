//! Which request paths the gate looks at

/// Prefixes never gated: storefront assets, API routes (which authorize on
/// their own), the platform error pages the gate redirects to, and the edge's
/// own health checks.
const UNGATED_PREFIXES: &[&str] = &[
    "/api",
    "/_next/static",
    "/_next/image",
    "/favicon.ico",
    "/health",
    "/not-found",
    "/error",
];

/// Path rules for the request gate
#[derive(Debug, Clone)]
pub struct GatePaths {
    dashboard_prefix: String,
    login_path: String,
}

impl GatePaths {
    pub fn new(dashboard_prefix: &str, login_path: &str) -> Self {
        Self {
            dashboard_prefix: dashboard_prefix.trim_end_matches('/').to_string(),
            login_path: login_path.to_string(),
        }
    }

    /// Whether tenant resolution runs for this path at all
    pub fn is_gated(&self, path: &str) -> bool {
        !UNGATED_PREFIXES.iter().any(|prefix| is_under(path, prefix))
    }

    /// Dashboard routes require a session
    pub fn is_dashboard(&self, path: &str) -> bool {
        !self.dashboard_prefix.is_empty() && is_under(path, &self.dashboard_prefix)
    }

    /// Login URL that returns to `path` after signing in
    pub fn login_redirect(&self, path: &str) -> String {
        let callback: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
        format!("{}?callbackUrl={}", self.login_path, callback)
    }
}

impl Default for GatePaths {
    fn default() -> Self {
        Self::new("/dashboard", "/auth/login")
    }
}

/// `path` equals `prefix` or is below it (`/api` covers `/api/x`, not `/apiary`)
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ungated_paths() {
        let paths = GatePaths::default();
        for path in [
            "/api",
            "/api/products",
            "/_next/static/chunks/main.js",
            "/_next/image",
            "/favicon.ico",
            "/health",
            "/health/ready",
            "/not-found",
            "/error",
        ] {
            assert!(!paths.is_gated(path), "{path} should not be gated");
        }
    }

    #[test]
    fn test_gated_paths() {
        let paths = GatePaths::default();
        for path in ["/", "/products/shoes", "/dashboard", "/apiary", "/errors-and-omissions"] {
            assert!(paths.is_gated(path), "{path} should be gated");
        }
    }

    #[test]
    fn test_dashboard_paths() {
        let paths = GatePaths::default();
        assert!(paths.is_dashboard("/dashboard"));
        assert!(paths.is_dashboard("/dashboard/orders"));
        assert!(!paths.is_dashboard("/dashboards"));
        assert!(!paths.is_dashboard("/products"));

        let paths = GatePaths::new("/admin/", "/login");
        assert!(paths.is_dashboard("/admin/settings"));
    }

    #[test]
    fn test_login_redirect() {
        let paths = GatePaths::default();
        assert_eq!(
            paths.login_redirect("/dashboard/orders"),
            "/auth/login?callbackUrl=%2Fdashboard%2Forders"
        );
        assert_eq!(
            paths.login_redirect("/dashboard/a b"),
            "/auth/login?callbackUrl=%2Fdashboard%2Fa+b"
        );
    }
}
