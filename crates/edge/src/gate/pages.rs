//! Responses produced by the gate itself
//!
//! Development gets HTML diagnostic pages explaining what went wrong;
//! production only ever sees redirects.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use storely_shared::TenantInfo;

use crate::routing::ORG_QUERY_PARAM;
use crate::security::apply_gate_headers;

/// Diagnostic page shown to developers on loopback hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticPage {
    /// 400: a non-root path was requested without `?org=`
    MissingOrgParam { host: String, path: String },
    /// 404: no tenant could be derived, or the organization service rejected it
    TenantNotFound { host: String, tenant: TenantInfo },
    /// 500: the tenant could not be validated at all
    ValidationFailed { host: String, message: String },
}

impl DiagnosticPage {
    pub fn status(&self) -> StatusCode {
        match self {
            DiagnosticPage::MissingOrgParam { .. } => StatusCode::BAD_REQUEST,
            DiagnosticPage::TenantNotFound { .. } => StatusCode::NOT_FOUND,
            DiagnosticPage::ValidationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn render(&self) -> String {
        match self {
            DiagnosticPage::MissingOrgParam { host, path } => {
                let example = format!("{}?{}=demo", path, ORG_QUERY_PARAM);
                page(
                    "Missing tenant parameter",
                    &format!(
                        r#"<p>Requests to <code>{host}</code> need an <code>{param}</code> query parameter naming the store subdomain.</p>
    <p>Try <a href="{example}">{example_text}</a>.</p>"#,
                        host = escape_html(host),
                        param = ORG_QUERY_PARAM,
                        example = escape_html(&example),
                        example_text = escape_html(&example),
                    ),
                )
            }
            DiagnosticPage::TenantNotFound { host, tenant } => page(
                "Store not found",
                &format!(
                    r#"<p>No active store matches this request.</p>
    <table>
        <tr><th>Host</th><td><code>{host}</code></td></tr>
        <tr><th>Subdomain</th><td><code>{subdomain}</code></td></tr>
        <tr><th>Custom domain</th><td><code>{domain}</code></td></tr>
    </table>
    <p>Check that the organization exists, is active and is not on an expired or suspended plan.</p>"#,
                    host = escape_html(host),
                    subdomain = escape_html(&tenant.subdomain),
                    domain = escape_html(tenant.custom_domain().unwrap_or("-")),
                ),
            ),
            DiagnosticPage::ValidationFailed { host, message } => page(
                "Tenant validation error",
                &format!(
                    r#"<p>The store for <code>{host}</code> could not be validated.</p>
    <pre>{message}</pre>
    <p>Check <code>API_BASE_URL</code> and that the organization service is running.</p>"#,
                    host = escape_html(host),
                    message = escape_html(message),
                ),
            ),
        }
    }
}

impl IntoResponse for DiagnosticPage {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Html(self.render())).into_response();
        apply_gate_headers(response.headers_mut());
        response
    }
}

/// Temporary redirect carrying the gate's security headers
pub fn redirect(location: &str) -> Response {
    let mut response = Redirect::temporary(location).into_response();
    apply_gate_headers(response.headers_mut());
    response
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - Storely</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 640px; margin: 40px auto; padding: 20px;">
    <h2 style="color: #dc2626;">{title}</h2>
    {body}
    <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
    <p style="color: #999; font-size: 12px;">Storely edge (development mode)</p>
</body>
</html>"#,
        title = title,
        body = body,
    )
}

/// Escape text interpolated into diagnostic HTML
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script>&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#x27;"
        );
        assert_eq!(escape_html("acme"), "acme");
    }

    #[test]
    fn test_statuses() {
        let missing = DiagnosticPage::MissingOrgParam {
            host: "localhost:3000".to_string(),
            path: "/products".to_string(),
        };
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let not_found = DiagnosticPage::TenantNotFound {
            host: "localhost:3000".to_string(),
            tenant: TenantInfo::invalid(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let failed = DiagnosticPage::ValidationFailed {
            host: "localhost:3000".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_page_escapes_request_data() {
        let page = DiagnosticPage::TenantNotFound {
            host: "localhost:3000".to_string(),
            tenant: TenantInfo::from_subdomain("<img src=x>"),
        };
        let html = page.render();
        assert!(html.contains("&lt;img src=x&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_missing_org_page_suggests_override() {
        let page = DiagnosticPage::MissingOrgParam {
            host: "localhost:3000".to_string(),
            path: "/products".to_string(),
        };
        assert!(page.render().contains("/products?org=demo"));
    }

    #[test]
    fn test_diagnostic_response() {
        let response = DiagnosticPage::ValidationFailed {
            host: "localhost:3000".to_string(),
            message: "boom".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
    }

    #[test]
    fn test_redirect() {
        let response = redirect("/not-found");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/not-found");
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "no-store, no-cache, must-revalidate, private"
        );
    }
}
