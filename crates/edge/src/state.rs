//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::gate::{GatePaths, TenantGate};
use crate::proxy::UpstreamClient;
use crate::routing::ValidationCache;
use crate::session::SessionAuthenticator;
use crate::validation::{HttpOrganizationValidator, OrganizationValidator};

/// State shared by the gate middleware and the handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<TenantGate>,
    pub upstream: UpstreamClient,
    pub validation_cache: Option<Arc<ValidationCache>>,
}

impl AppState {
    /// Wire up the organization service client, sessions and upstream from config
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let mut validator =
            HttpOrganizationValidator::new(&config.api_base_url, config.validation_timeout())?;

        let validation_cache = config
            .tenant_cache_ttl()
            .map(|ttl| Arc::new(ValidationCache::with_ttl(ttl)));
        if let Some(cache) = &validation_cache {
            validator = validator.with_cache(cache.clone());
        }

        let upstream = UpstreamClient::new(
            &config.upstream_url,
            config.upstream_timeout(),
            config.max_proxy_body_bytes,
        )?;

        Ok(Self::new(config, Arc::new(validator), upstream, validation_cache))
    }

    /// Assemble state around an arbitrary validator
    pub fn new(
        config: Config,
        validator: Arc<dyn OrganizationValidator>,
        upstream: UpstreamClient,
        validation_cache: Option<Arc<ValidationCache>>,
    ) -> Self {
        let sessions = match &config.session_secret {
            Some(secret) => SessionAuthenticator::with_secret(&config.session_cookie_name, secret),
            None => SessionAuthenticator::new(&config.session_cookie_name),
        };

        let gate = TenantGate::new(
            config.environment,
            validator,
            sessions,
            GatePaths::new(&config.dashboard_prefix, &config.login_path),
            &config.root_domain_url,
        );

        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            upstream,
            validation_cache,
        }
    }
}
