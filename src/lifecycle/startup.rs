//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the network provider, optional external router and engine
//! - Build the rate limiter over its usage store
//! - Start background maintenance (usage pruning, cache expiry) bound to
//!   the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::engine::{EngineSettings, OptimizationEngine};
use crate::http::AppState;
use crate::network::NetworkRows;
use crate::provider::{OsrmClient, ProviderError, StaticNetworkProvider};
use crate::security::{ApiKeyRegistry, InMemoryUsageStore, RateLimiter};

/// How often usage records and expired cache entries are pruned.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Usage older than this is dropped; matches the longest summary window.
pub const USAGE_RETENTION: Duration = Duration::from_secs(720 * 60 * 60);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load road network: {0}")]
    Network(#[source] ProviderError),

    #[error("failed to initialize external routing: {0}")]
    ExternalRouting(#[source] ProviderError),
}

/// Wire every subsystem from configuration.
pub fn build_state(config: &AppConfig, clock: SharedClock) -> Result<AppState, StartupError> {
    let provider = match &config.network.path {
        Some(path) => StaticNetworkProvider::from_json_file(path).map_err(StartupError::Network)?,
        None => {
            tracing::warn!("No road network configured; every request will report no route");
            StaticNetworkProvider::from_rows(&NetworkRows::default())
                .map_err(|e| StartupError::Network(ProviderError::Malformed(e.to_string())))?
        }
    };

    let mut engine = OptimizationEngine::new(
        Arc::new(provider),
        EngineSettings::from_config(config),
        clock.clone(),
    );
    if config.external_routing.enabled {
        let client =
            OsrmClient::new(&config.external_routing).map_err(StartupError::ExternalRouting)?;
        tracing::info!(
            base_url = %config.external_routing.base_url,
            "External routing fallback enabled"
        );
        engine = engine.with_geometry_provider(Arc::new(client));
    }

    let limiter = RateLimiter::new(
        &config.rate_limit,
        Arc::new(InMemoryUsageStore::new()),
        clock.clone(),
    );
    let api_keys = ApiKeyRegistry::from_config(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("No API keys configured; protected endpoints will reject every request");
    }

    tracing::info!(
        api_keys = api_keys.len(),
        rate_limit_enabled = config.rate_limit.enabled,
        tiers = config.rate_limit.tiers.len(),
        "Subsystems initialized"
    );

    Ok(AppState {
        engine: Arc::new(engine),
        limiter: Arc::new(limiter),
        api_keys: Arc::new(api_keys),
        rate_limit_enabled: config.rate_limit.enabled,
        clock,
        started_at: Instant::now(),
    })
}

/// Periodically prune usage records and expired cache entries until shutdown.
pub fn spawn_maintenance(
    engine: Arc<OptimizationEngine>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
    retention: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = limiter.prune_usage(retention).await {
                        tracing::warn!(error = %e, "Usage pruning failed");
                    }
                    let expired = engine.purge_expired_caches();
                    tracing::debug!(expired, "Purged expired cache entries");
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Maintenance stopping");
                    break;
                }
            }
        }
    })
}
