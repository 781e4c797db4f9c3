//! Host header parsing
//!
//! Extracts a candidate tenant subdomain from the request host:
//! - Local development: acme.localhost:3000 -> acme
//! - Platform subdomains: acme.storely.com -> acme
//! - Bare root domain (storely.com), loopback addresses and reserved labels yield nothing

use std::net::{IpAddr, Ipv6Addr};

/// Leading labels that belong to the platform itself, never to a tenant
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin"];

/// Extract the tenant subdomain from a host.
///
/// Pure function; the same host always yields the same answer.
pub fn parse_subdomain(host: &str) -> Option<String> {
    let host = normalize_host(host);
    // 127.0.0.1 is the developer's machine, not tenant "127"
    if is_loopback_ip(&host) {
        return None;
    }
    let labels: Vec<&str> = host.split('.').collect();

    let candidate = if host.contains("localhost") {
        // acme.localhost, but not www.localhost or bare localhost
        if labels.len() >= 2 && labels[0] != "www" {
            labels[0]
        } else {
            return None;
        }
    } else {
        // acme.storely.com; storely.com is the root domain
        if labels.len() >= 3 && !RESERVED_SUBDOMAINS.contains(&labels[0]) {
            labels[0]
        } else {
            return None;
        }
    };

    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

/// Normalize a host header value
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    // Remove port if present; IPv6 literals arrive bracketed ([::1]:3000)
    let host = match host.strip_prefix('[') {
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        // Already unwrapped, no port left
        None if host.parse::<Ipv6Addr>().is_ok() => host,
        None => host.split(':').next().unwrap_or(host),
    };
    // Lowercase, and drop the trailing dot of a fully qualified name
    host.trim_end_matches('.').to_lowercase()
}

/// Local development hosts
pub fn is_loopback_host(host: &str) -> bool {
    let host = normalize_host(host);
    host.contains("localhost") || is_loopback_ip(&host)
}

fn is_loopback_ip(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}
