//! Host-to-Tenant Resolution
//!
//! Decides which tenant an inbound request is addressed to, in order:
//! 1. Development override: ?org=acme on a loopback host
//! 2. Platform subdomain: acme.storely.com
//! 3. Custom domain: acme-shop.com (any other non-loopback host)

use storely_shared::TenantInfo;

use super::host::{is_loopback_host, normalize_host, parse_subdomain};

/// Query parameter that selects a tenant when running on localhost
pub const ORG_QUERY_PARAM: &str = "org";

/// Resolves request hosts to tenants. No I/O; the organization id is filled in
/// later by the validator.
#[derive(Debug, Clone, Copy)]
pub struct TenantResolver {
    allow_dev_override: bool,
}

impl TenantResolver {
    /// `allow_dev_override` enables the `org` query parameter on loopback hosts
    pub fn new(allow_dev_override: bool) -> Self {
        Self { allow_dev_override }
    }

    /// Resolve a tenant from the host header and the raw query string
    pub fn resolve(&self, host: &str, query: Option<&str>) -> TenantInfo {
        let host = normalize_host(host);
        let loopback = is_loopback_host(&host);

        if self.allow_dev_override && loopback {
            if let Some(org) = org_param(query) {
                return TenantInfo::from_subdomain(org);
            }
        }

        if let Some(subdomain) = parse_subdomain(&host) {
            return TenantInfo::from_subdomain(subdomain);
        }

        if !loopback && !host.is_empty() {
            return TenantInfo::from_custom_domain(host);
        }

        TenantInfo::invalid()
    }
}

/// Value of the `org` query parameter, ignoring an empty one
pub fn org_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == ORG_QUERY_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
