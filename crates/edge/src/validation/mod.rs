//! Organization validation
//!
//! Confirms with the organization service that a resolved tenant exists, is
//! active and is on a plan that may serve a storefront.

mod client;

pub use client::HttpOrganizationValidator;

use async_trait::async_trait;
use storely_shared::TenantInfo;

/// Checks a resolved tenant against the organization service.
///
/// `Ok` carries the service's verdict: a confirmed tenant, or an invalid one
/// when the organization is unknown, inactive or on a lapsed plan. An
/// unreachable or misbehaving service is an `Err`, which the gate denies.
#[async_trait]
pub trait OrganizationValidator: Send + Sync {
    async fn validate(&self, tenant: &TenantInfo) -> Result<TenantInfo, ValidationError>;
}

/// What a tenant is looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey<'a> {
    Subdomain(&'a str),
    CustomDomain(&'a str),
}

impl<'a> LookupKey<'a> {
    /// Subdomain takes precedence; `None` when the tenant carries neither
    pub fn for_tenant(tenant: &'a TenantInfo) -> Option<Self> {
        if !tenant.subdomain.is_empty() {
            Some(LookupKey::Subdomain(&tenant.subdomain))
        } else {
            tenant.custom_domain().map(LookupKey::CustomDomain)
        }
    }

    /// Endpoint name under `/organization/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            LookupKey::Subdomain(_) => "validate-subdomain",
            LookupKey::CustomDomain(_) => "validate-domain",
        }
    }

    pub fn value(&self) -> &'a str {
        match self {
            LookupKey::Subdomain(value) | LookupKey::CustomDomain(value) => value,
        }
    }

    pub fn cache_key(&self) -> String {
        match self {
            LookupKey::Subdomain(value) => format!("subdomain:{}", value),
            LookupKey::CustomDomain(value) => format!("domain:{}", value),
        }
    }
}

/// Reasons no verdict could be obtained for a tenant
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Organization service unavailable: {0}")]
    Unavailable(String),

    #[error("Tenant has neither a subdomain nor a custom domain")]
    NothingToValidate,

    #[error("Invalid organization service URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}
