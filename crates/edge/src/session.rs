//! Session presence checks for dashboard routes
//!
//! The storefront's auth provider stores its session in a cookie. When a
//! session secret is configured the cookie must be a valid HS256 token;
//! otherwise a non-empty cookie is enough.

use axum::http::{header, HeaderMap};
use cookie::Cookie;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Prefix browsers enforce for cookies set over HTTPS only
const SECURE_COOKIE_PREFIX: &str = "__Secure-";

/// Claims we need from a session token
#[derive(Debug, Deserialize)]
struct SessionClaims {
    #[allow(dead_code)] // Required so tokens without a subject are rejected
    sub: String,
    #[allow(dead_code)] // Checked by jsonwebtoken's Validation
    exp: i64,
}

/// Looks up the session cookie on a request
#[derive(Clone)]
pub struct SessionAuthenticator {
    cookie_name: String,
    secure_cookie_name: String,
    decoding_key: Option<DecodingKey>,
}

impl SessionAuthenticator {
    /// Accept any non-empty session cookie
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: cookie_name.to_string(),
            secure_cookie_name: format!("{}{}", SECURE_COOKIE_PREFIX, cookie_name),
            decoding_key: None,
        }
    }

    /// Only accept session cookies signed with `secret`
    pub fn with_secret(cookie_name: &str, secret: &str) -> Self {
        Self {
            decoding_key: Some(DecodingKey::from_secret(secret.as_bytes())),
            ..Self::new(cookie_name)
        }
    }

    /// Whether the request carries a usable session
    pub fn has_session(&self, headers: &HeaderMap) -> bool {
        self.session_tokens(headers)
            .iter()
            .any(|token| self.accepts(token))
    }

    fn session_tokens(&self, headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value.to_string()))
            .filter_map(Result::ok)
            .filter(|c| c.name() == self.cookie_name || c.name() == self.secure_cookie_name)
            .map(|c| c.value().to_string())
            .collect()
    }

    fn accepts(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        let Some(key) = &self.decoding_key else {
            return true;
        };

        // Explicit algorithm prevents algorithm confusion attacks
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(token, key, &validation) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                false
            }
        }
    }
}
