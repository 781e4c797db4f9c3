//! Storefront upstream forwarding
//!
//! Requests that pass the gate are replayed against the storefront
//! application, tenant headers included.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Uri},
    response::Response,
};
use http_body_util::LengthLimitError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Headers that describe a single connection and must not be forwarded
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Timeout for the readiness probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for the storefront application
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base: Url,
    max_body_bytes: usize,
}

impl UpstreamClient {
    pub fn new(base: &str, timeout: Duration, max_body_bytes: usize) -> anyhow::Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Upstream URL cannot be a base: {}", base);
        }

        // Redirects go back to the browser untouched
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            base,
            max_body_bytes,
        })
    }

    /// Upstream URL for an inbound request URI
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        let base_path = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", base_path, uri.path()));
        url.set_query(uri.query());
        url
    }

    /// Forward a request and relay the storefront's answer
    pub async fn forward(&self, request: Request) -> ApiResult<Response> {
        let (parts, body) = request.into_parts();
        let url = self.target_url(&parts.uri);

        let mut headers = strip_hop_by_hop(&parts.headers);
        if let Some(host) = parts.headers.get(header::HOST) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host.clone());
        }
        headers.remove(header::HOST);
        // Recomputed from the buffered body
        headers.remove(header::CONTENT_LENGTH);

        let body = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(request_body_error)?;

        debug!(method = %parts.method, url = %url, "Forwarding to storefront");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers());

        // Storefront pages and assets stream through without buffering
        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Whether the storefront answers at all
    pub async fn is_reachable(&self) -> bool {
        self.client
            .get(self.base.clone())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}

/// Fallback handler: everything the edge does not serve itself goes upstream
pub async fn forward(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    state.upstream.forward(request).await
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Only an exceeded limit is the client's oversized upload; anything else is
/// a body that could not be read (aborted upload, bad chunking)
fn request_body_error(err: axum::Error) -> ApiError {
    let err = err.into_inner();
    if err.downcast_ref::<LengthLimitError>().is_some() {
        ApiError::PayloadTooLarge
    } else {
        debug!(error = %err, "Failed to read request body");
        ApiError::BadRequest("Failed to read request body".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use mockito::Server;

    fn upstream(base: &str) -> UpstreamClient {
        UpstreamClient::new(base, Duration::from_secs(2), 1024).unwrap()
    }

    #[test]
    fn test_target_url() {
        let client = upstream("http://storefront.internal:3001");
        let uri: Uri = "/products/shoes?page=2".parse().unwrap();
        assert_eq!(
            client.target_url(&uri).as_str(),
            "http://storefront.internal:3001/products/shoes?page=2"
        );

        let client = upstream("http://storefront.internal/shop/");
        let uri: Uri = "/cart".parse().unwrap();
        assert_eq!(client.target_url(&uri).as_str(), "http://storefront.internal/shop/cart");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let stripped = strip_hop_by_hop(&headers);

        assert!(stripped.get(header::CONNECTION).is_none());
        assert!(stripped.get("keep-alive").is_none());
        assert!(stripped.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(stripped.get(header::CONTENT_LENGTH).unwrap(), "12");
        assert_eq!(stripped.get(header::ACCEPT).unwrap(), "text/html");
        assert_eq!(stripped.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn test_forward_relays_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/cart/items")
            .match_header("x-organization-id", "org_1")
            .match_header("x-forwarded-host", "acme.storely.com")
            .match_body("sku=42")
            .with_status(201)
            .with_header("x-storefront", "yes")
            .with_body("added")
            .create_async()
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/cart/items")
            .header(header::HOST, "acme.storely.com")
            .header("x-organization-id", "org_1")
            .body(Body::from("sku=42"))
            .unwrap();

        let response = upstream(&server.url()).forward(request).await.unwrap();

        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.headers().get("x-storefront").unwrap(), "yes");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"added");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_does_not_follow_redirects() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/old")
            .with_status(308)
            .with_header("location", "/new")
            .create_async()
            .await;

        let request = Request::builder().uri("/old").body(Body::empty()).unwrap();
        let response = upstream(&server.url()).forward(request).await.unwrap();

        assert_eq!(response.status().as_u16(), 308);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/new");
    }

    #[tokio::test]
    async fn test_forward_rejects_oversized_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from(vec![0u8; 4096]))
            .unwrap();

        let result = upstream("http://127.0.0.1:9").forward(request).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge)));
    }

    #[test]
    fn test_unreadable_body_is_bad_request() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert!(matches!(request_body_error(err), ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_forward_streams_large_responses() {
        let mut server = Server::new_async().await;
        let asset = "x".repeat(64 * 1024);
        server
            .mock("GET", "/_next/static/app.js")
            .with_status(200)
            .with_body(&asset)
            .create_async()
            .await;

        // The request body limit (1 KiB here) does not apply to responses
        let request = Request::builder()
            .uri("/_next/static/app.js")
            .body(Body::empty())
            .unwrap();
        let response = upstream(&server.url()).forward(request).await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.len(), asset.len());
    }

    #[tokio::test]
    async fn test_forward_unreachable_upstream() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let result = upstream("http://127.0.0.1:9").forward(request).await;
        assert!(matches!(result, Err(ApiError::BadGateway(_))));
        assert!(!upstream("http://127.0.0.1:9").is_reachable().await);
    }
}
