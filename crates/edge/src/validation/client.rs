//! HTTP client for the organization service
//!
//! Calls `GET {api_base}/organization/validate-subdomain/{subdomain}` or
//! `GET {api_base}/organization/validate-domain/{domain}` with a bounded
//! timeout and no retries. A 404 means the service does not know the tenant;
//! any other failure means it could not answer.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use storely_shared::{OrganizationLookup, TenantInfo};
use tracing::{debug, warn};
use url::Url;

use super::{LookupKey, OrganizationValidator, ValidationError};
use crate::routing::{CachedVerdict, ValidationCache};

/// Organization validator backed by the organization service HTTP API
#[derive(Clone)]
pub struct HttpOrganizationValidator {
    client: Client,
    api_base: Url,
    cache: Option<Arc<ValidationCache>>,
}

/// Reasons a lookup produced no usable answer
#[derive(Debug, thiserror::Error)]
enum LookupFailure {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Decode(reqwest::Error),
}

impl From<reqwest::Error> for LookupFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupFailure::Timeout
        } else if err.is_decode() {
            LookupFailure::Decode(err)
        } else {
            LookupFailure::Transport(err)
        }
    }
}

impl HttpOrganizationValidator {
    /// Create a validator for the given service base URL
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, ValidationError> {
        let api_base =
            Url::parse(api_base).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(ValidationError::InvalidUrl(api_base.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base,
            cache: None,
        })
    }

    /// Cache definitive answers in `cache`
    pub fn with_cache(mut self, cache: Arc<ValidationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Get the validation cache, if enabled
    pub fn cache(&self) -> Option<&ValidationCache> {
        self.cache.as_deref()
    }

    /// Build the lookup URL; the key is percent-encoded as a single path segment
    pub fn lookup_url(&self, key: &LookupKey<'_>) -> Result<Url, ValidationError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ValidationError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["organization", key.endpoint(), key.value()]);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<OrganizationLookup, LookupFailure> {
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(OrganizationLookup::default());
        }
        if !status.is_success() {
            return Err(LookupFailure::Status(status));
        }

        Ok(response.json::<OrganizationLookup>().await?)
    }
}

#[async_trait]
impl OrganizationValidator for HttpOrganizationValidator {
    async fn validate(&self, tenant: &TenantInfo) -> Result<TenantInfo, ValidationError> {
        let key = LookupKey::for_tenant(tenant).ok_or(ValidationError::NothingToValidate)?;
        let cache_key = key.cache_key();

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            debug!(key = %cache_key, verdict = ?cached, "Tenant validation served from cache");
            return Ok(match cached {
                CachedVerdict::Confirmed(organization_id) => tenant.confirmed(organization_id),
                CachedVerdict::Rejected => tenant.rejected(),
            });
        }

        let url = self.lookup_url(&key)?;
        match self.fetch(url).await {
            Ok(lookup) => {
                let validated = if lookup.is_valid() {
                    tenant.confirmed(lookup.organization_id())
                } else {
                    tenant.rejected()
                };

                debug!(
                    key = %cache_key,
                    valid = validated.is_valid,
                    organization_id = %validated.organization_id,
                    "Tenant validated"
                );

                if let Some(cache) = &self.cache {
                    let verdict = if validated.is_valid {
                        CachedVerdict::Confirmed(validated.organization_id.clone())
                    } else {
                        CachedVerdict::Rejected
                    };
                    cache.set(&cache_key, verdict);
                }

                Ok(validated)
            }
            Err(failure) => {
                warn!(key = %cache_key, error = %failure, "Organization service unavailable");
                Err(ValidationError::Unavailable(failure.to_string()))
            }
        }
    }
}
