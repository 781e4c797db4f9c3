//! Application configuration

use std::env;
use std::time::Duration;

/// Deployment environment the edge runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Loopback requests get the `org` override and diagnostic pages
    Development,
    /// Every failure is answered with a redirect
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid("APP_ENV must be 'development' or 'production'")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub environment: Environment,
    pub root_domain_url: String, // e.g., "https://storely.com", where unknown hosts are sent

    // Organization service
    pub api_base_url: String,
    pub validation_timeout_ms: u64,
    pub tenant_cache_ttl_secs: u64,

    // Storefront upstream
    pub upstream_url: String,
    pub upstream_timeout_ms: u64,
    pub max_proxy_body_bytes: usize,

    // Sessions
    pub session_cookie_name: String,
    pub session_secret: Option<String>,

    // Paths
    pub dashboard_prefix: String,
    pub login_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            environment: match env::var("APP_ENV") {
                Ok(value) => Environment::parse(&value)?,
                Err(_) => Environment::Development,
            },
            root_domain_url: env::var("ROOT_DOMAIN_URL")
                .unwrap_or_else(|_| "https://storely.com".to_string()),

            // Organization service
            api_base_url: {
                let url = env::var("API_BASE_URL").map_err(|_| ConfigError::Missing("API_BASE_URL"))?;
                validate_http_url(&url, "API_BASE_URL must be an absolute http(s) URL")?;
                url
            },
            validation_timeout_ms: {
                let timeout = env::var("TENANT_VALIDATION_TIMEOUT_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000);
                // An unbounded lookup would hold every storefront request hostage
                if timeout == 0 {
                    return Err(ConfigError::Invalid(
                        "TENANT_VALIDATION_TIMEOUT_MS must be greater than zero",
                    ));
                }
                timeout
            },
            tenant_cache_ttl_secs: env::var("TENANT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),

            // Storefront upstream
            upstream_url: {
                let url = env::var("UPSTREAM_URL").map_err(|_| ConfigError::Missing("UPSTREAM_URL"))?;
                validate_http_url(&url, "UPSTREAM_URL must be an absolute http(s) URL")?;
                url
            },
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30000),
            max_proxy_body_bytes: env::var("MAX_PROXY_BODY_BYTES")
                .unwrap_or_else(|_| "10485760".to_string()) // 10MB default
                .parse()
                .unwrap_or(10_485_760),

            // Sessions
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .ok()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "storely.session-token".to_string()),
            session_secret: match env::var("SESSION_SECRET") {
                Ok(secret) if !secret.is_empty() => {
                    if secret.len() < 32 {
                        return Err(ConfigError::WeakSecret(
                            "SESSION_SECRET must be at least 32 characters",
                        ));
                    }
                    Some(secret)
                }
                _ => None,
            },

            // Paths
            dashboard_prefix: env::var("DASHBOARD_PREFIX")
                .unwrap_or_else(|_| "/dashboard".to_string()),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/auth/login".to_string()),
        })
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// `None` when validation caching is disabled
    pub fn tenant_cache_ttl(&self) -> Option<Duration> {
        (self.tenant_cache_ttl_secs > 0).then(|| Duration::from_secs(self.tenant_cache_ttl_secs))
    }
}

fn validate_http_url(value: &str, message: &'static str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::Invalid(message)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ALL_VARS: &[&str] = &[
        "BIND_ADDRESS",
        "APP_ENV",
        "ROOT_DOMAIN_URL",
        "API_BASE_URL",
        "TENANT_VALIDATION_TIMEOUT_MS",
        "TENANT_CACHE_TTL_SECS",
        "UPSTREAM_URL",
        "UPSTREAM_TIMEOUT_MS",
        "MAX_PROXY_BODY_BYTES",
        "SESSION_COOKIE_NAME",
        "SESSION_SECRET",
        "DASHBOARD_PREFIX",
        "LOGIN_PATH",
    ];

    /// Helper to set required env vars for testing
    fn setup_minimal_config() {
        cleanup_config();
        env::set_var("API_BASE_URL", "http://orgs.internal/api");
        env::set_var("UPSTREAM_URL", "http://storefront.internal:3001");
    }

    /// Helper to clear env vars after tests
    fn cleanup_config() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.root_domain_url, "https://storely.com");
        assert_eq!(config.validation_timeout(), Duration::from_secs(3));
        assert_eq!(config.tenant_cache_ttl(), None);
        assert_eq!(config.session_cookie_name, "storely.session-token");
        assert!(config.session_secret.is_none());
        assert_eq!(config.dashboard_prefix, "/dashboard");
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.max_proxy_body_bytes, 10_485_760);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(30));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_required_urls() {
        cleanup_config();
        env::set_var("UPSTREAM_URL", "http://storefront.internal:3001");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("API_BASE_URL"))
        ));

        env::set_var("API_BASE_URL", "not a url");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        env::set_var("API_BASE_URL", "ftp://orgs.internal");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        env::set_var("API_BASE_URL", "https://orgs.internal");
        env::remove_var("UPSTREAM_URL");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("UPSTREAM_URL"))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_environment_parsing() {
        setup_minimal_config();

        env::set_var("APP_ENV", "production");
        assert_eq!(Config::from_env().unwrap().environment, Environment::Production);

        env::set_var("APP_ENV", "Development");
        assert_eq!(Config::from_env().unwrap().environment, Environment::Development);

        env::set_var("APP_ENV", "staging");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_validation_timeout_must_be_bounded() {
        setup_minimal_config();

        env::set_var("TENANT_VALIDATION_TIMEOUT_MS", "0");
        assert!(matches!(Config::from_env(), Err(ConfigError::Invalid(_))));

        env::set_var("TENANT_VALIDATION_TIMEOUT_MS", "1500");
        assert_eq!(
            Config::from_env().unwrap().validation_timeout(),
            Duration::from_millis(1500)
        );

        // Garbage falls back to the default
        env::set_var("TENANT_VALIDATION_TIMEOUT_MS", "soon");
        assert_eq!(
            Config::from_env().unwrap().validation_timeout(),
            Duration::from_secs(3)
        );

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_session_secret_strength() {
        setup_minimal_config();

        env::set_var("SESSION_SECRET", "short");
        assert!(matches!(Config::from_env(), Err(ConfigError::WeakSecret(_))));

        env::set_var("SESSION_SECRET", "a-session-secret-that-is-long-enough-123");
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.session_secret.as_deref(),
            Some("a-session-secret-that-is-long-enough-123")
        );

        // Empty means unsigned sessions
        env::set_var("SESSION_SECRET", "");
        assert!(Config::from_env().unwrap().session_secret.is_none());

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_cache_ttl() {
        setup_minimal_config();

        env::set_var("TENANT_CACHE_TTL_SECS", "60");
        assert_eq!(
            Config::from_env().unwrap().tenant_cache_ttl(),
            Some(Duration::from_secs(60))
        );

        cleanup_config();
    }
}
