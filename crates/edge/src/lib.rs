//! Storely Edge Library
//!
//! Tenant resolution and request gating in front of the Storely storefront.

pub mod config;
pub mod error;
pub mod gate;
pub mod proxy;
pub mod routes;
pub mod routing;
pub mod security;
pub mod session;
pub mod state;
pub mod validation;

pub use config::{Config, Environment};
pub use error::{ApiError, ApiResult};
pub use gate::{GateDecision, TenantGate};
pub use routing::{TenantResolver, ValidationCache};
pub use state::AppState;
pub use validation::{HttpOrganizationValidator, OrganizationValidator};
