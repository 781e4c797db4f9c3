//! Security headers for gate responses
//!
//! Diagnostic pages and redirects are produced by the edge, not the
//! storefront, so they get a fixed, restrictive header set. Proxied storefront
//! responses keep whatever headers the storefront sends.

use axum::http::{HeaderMap, HeaderValue};

/// Add security headers to a gate-generated response
pub fn apply_gate_headers(headers: &mut HeaderMap) {
    // X-Frame-Options: Prevent clickjacking attacks
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    // X-Content-Type-Options: Prevent MIME type sniffing
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );

    // Referrer-Policy: Control referrer information leakage
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Content-Security-Policy: diagnostic pages only use inline styles
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(
            "default-src 'none'; \
             style-src 'unsafe-inline'; \
             frame-ancestors 'none'; \
             base-uri 'none'; \
             form-action 'none'",
        ),
    );

    // Tenant state can change at any time; never cache a denial
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );
}
