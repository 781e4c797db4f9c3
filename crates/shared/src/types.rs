//! Common types used across Storely

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Tenant
// =============================================================================

/// Tenant resolved for a single inbound request.
///
/// Built by the resolver at the start of request handling and dropped with the
/// request. `organization_id` stays empty until the organization service has
/// confirmed the tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub organization_id: String,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub is_valid: bool,
}

impl TenantInfo {
    /// A tenant that could not be derived from the request
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Tenant addressed by a subdomain label (or the development `org` override)
    pub fn from_subdomain(subdomain: impl Into<String>) -> Self {
        Self {
            organization_id: String::new(),
            subdomain: subdomain.into(),
            custom_domain: None,
            is_valid: true,
        }
    }

    /// Tenant addressed by a full custom domain
    pub fn from_custom_domain(domain: impl Into<String>) -> Self {
        Self {
            organization_id: String::new(),
            subdomain: String::new(),
            custom_domain: Some(domain.into()),
            is_valid: true,
        }
    }

    /// The custom domain, treating an empty string as absent
    pub fn custom_domain(&self) -> Option<&str> {
        self.custom_domain.as_deref().filter(|d| !d.is_empty())
    }

    /// Whether there is anything to look up in the organization service
    pub fn needs_validation(&self) -> bool {
        !self.subdomain.is_empty() || self.custom_domain().is_some()
    }

    /// Copy of this tenant marked as confirmed for `organization_id`
    pub fn confirmed(&self, organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            is_valid: true,
            ..self.clone()
        }
    }

    /// Copy of this tenant marked as rejected
    pub fn rejected(&self) -> Self {
        Self {
            organization_id: String::new(),
            is_valid: false,
            ..self.clone()
        }
    }
}

// =============================================================================
// Organization
// =============================================================================

/// Subscription plan of an organization.
///
/// Plan names the platform does not know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Premium,
    Enterprise,
    Expired,
    Suspended,
    Other(String),
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Enterprise => "enterprise",
            SubscriptionPlan::Expired => "expired",
            SubscriptionPlan::Suspended => "suspended",
            SubscriptionPlan::Other(plan) => plan,
        }
    }

    /// Only expired and suspended plans disable a storefront; anything else,
    /// including unrecognized plan names, counts as active.
    pub fn is_inactive(&self) -> bool {
        matches!(self, SubscriptionPlan::Expired | SubscriptionPlan::Suspended)
    }
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        SubscriptionPlan::Other(String::new())
    }
}

impl From<String> for SubscriptionPlan {
    fn from(plan: String) -> Self {
        match plan.as_str() {
            "free" => SubscriptionPlan::Free,
            "basic" => SubscriptionPlan::Basic,
            "premium" => SubscriptionPlan::Premium,
            "enterprise" => SubscriptionPlan::Enterprise,
            "expired" => SubscriptionPlan::Expired,
            "suspended" => SubscriptionPlan::Suspended,
            _ => SubscriptionPlan::Other(plan),
        }
    }
}

impl From<&str> for SubscriptionPlan {
    fn from(plan: &str) -> Self {
        SubscriptionPlan::from(plan.to_string())
    }
}

impl From<SubscriptionPlan> for String {
    fn from(plan: SubscriptionPlan) -> Self {
        match plan {
            SubscriptionPlan::Other(plan) => plan,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization as reported by the organization service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub plan: SubscriptionPlan,
}

impl Organization {
    /// Active flag set and the plan is not an inactive-equivalent one
    pub fn can_serve_storefront(&self) -> bool {
        self.is_active && !self.plan.is_inactive()
    }
}

/// Response body of the subdomain and custom domain validation endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationLookup {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub organization: Option<Organization>,
}

impl OrganizationLookup {
    /// The lookup succeeded and the organization may serve traffic
    pub fn is_valid(&self) -> bool {
        self.success
            && self
                .organization
                .as_ref()
                .is_some_and(Organization::can_serve_storefront)
    }

    /// Organization id from the payload, empty when absent
    pub fn organization_id(&self) -> String {
        self.organization
            .as_ref()
            .and_then(|org| org.id.clone())
            .unwrap_or_default()
    }
}
