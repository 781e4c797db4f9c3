//! Storely edge server

use std::time::Duration;

use anyhow::Context;
use storely_edge::{routes::create_router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often expired validation cache entries are swept
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address.clone();

    tracing::info!(
        environment = ?config.environment,
        api_base_url = %config.api_base_url,
        upstream_url = %config.upstream_url,
        validation_timeout_ms = config.validation_timeout_ms,
        tenant_cache_ttl_secs = config.tenant_cache_ttl_secs,
        "Starting Storely edge"
    );

    let state = AppState::from_config(config).context("Failed to build application state")?;

    if let Some(cache) = state.validation_cache.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                cache.cleanup();
                let stats = cache.stats();
                tracing::debug!(active = stats.active_entries, "Validation cache swept");
            }
        });
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Storely edge listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// `RUST_LOG` filtering, JSON output when `LOG_FORMAT=json`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Keep serving; without a signal handler the process is stopped externally
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
