//! Host-based tenant routing
//!
//! This module maps the Host header of a storefront request to a tenant,
//! enabling tenant-specific URLs like:
//! - Platform subdomains: acme.storely.com
//! - Custom domains: acme-shop.com
//! - Local development: acme.localhost:3000 or localhost:3000/?org=acme

mod cache;
mod host;
mod resolver;

pub use cache::{CacheStats, CachedVerdict, ValidationCache};
pub use host::{is_loopback_host, normalize_host, parse_subdomain, RESERVED_SUBDOMAINS};
pub use resolver::{org_param, TenantResolver, ORG_QUERY_PARAM};
