//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::security::Strategy;

/// Root configuration for the route optimizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Search and snapping limits.
    pub engine: EngineConfig,

    /// Graph and route cache bounds.
    pub cache: CacheConfig,

    /// Per-tier request quotas.
    pub rate_limit: RateLimitConfig,

    /// Where the road network comes from.
    pub network: NetworkConfig,

    /// Optional OSRM fallback.
    pub external_routing: ExternalRoutingConfig,

    /// Retry policy for provider calls.
    pub retries: RetryConfig,

    /// Known API keys and their tiers.
    pub api_keys: Vec<ApiKeyConfig>,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Optimization engine limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock budget for the searches of one request, in milliseconds.
    pub search_timeout_ms: u64,

    /// Upper bound on alternatives per request.
    pub max_alternatives: usize,

    /// Endpoints further than this from any node are rejected.
    pub max_snap_distance_km: f64,

    /// Region padding as a fraction of the origin/destination span.
    pub bbox_padding_ratio: f64,

    /// Extra region padding in degrees.
    pub bbox_padding_degrees: f64,
}

impl EngineConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_timeout_ms: 8_000,
            max_alternatives: 3,
            max_snap_distance_km: 5.0,
            bbox_padding_ratio: 0.2,
            bbox_padding_degrees: 0.01,
        }
    }
}

/// Cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub graph_max_bytes: usize,
    pub graph_ttl_secs: u64,
    pub route_max_entries: usize,
    pub route_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            graph_max_bytes: 100 * 1024 * 1024,
            graph_ttl_secs: 300,
            route_max_entries: 1000,
            route_ttl_secs: 600,
        }
    }
}

/// Quota for one billing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierConfig {
    pub requests_per_minute: u32,
    pub strategy: Strategy,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Timeout for each usage-store call in milliseconds.
    pub store_timeout_ms: u64,

    /// Compare-and-swap attempts for token-bucket updates.
    pub cas_attempts: u32,

    /// Tier name to quota. Unknown tiers use `starter`.
    pub tiers: BTreeMap<String, TierConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let tiers = [
            ("trial", 5, Strategy::FixedWindow),
            ("starter", 10, Strategy::SlidingWindow),
            ("professional", 50, Strategy::SlidingWindow),
            ("enterprise", 200, Strategy::TokenBucket),
        ]
        .into_iter()
        .map(|(name, requests_per_minute, strategy)| {
            (
                name.to_string(),
                TierConfig {
                    requests_per_minute,
                    strategy,
                },
            )
        })
        .collect();

        Self {
            enabled: true,
            store_timeout_ms: 250,
            cas_attempts: 5,
            tiers,
        }
    }
}

/// Road network source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON file with `nodes` and `edges` rows.
    pub path: Option<PathBuf>,
}

/// External route geometry (OSRM) used when the network provider fails.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExternalRoutingConfig {
    pub enabled: bool,

    /// OSRM base URL, e.g. "https://router.project-osrm.org".
    pub base_url: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ExternalRoutingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExternalRoutingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Timeout for each attempt in milliseconds.
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            attempt_timeout_ms: 5_000,
        }
    }
}

/// A client API key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    /// Secret sent in `X-API-Key`.
    pub key: String,

    /// Stable identifier used for quotas and usage.
    pub id: String,

    /// Billing tier name.
    #[serde(default = "default_tier")]
    pub tier: String,
}

fn default_tier() -> String {
    "starter".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (e.g. "info" or "route_optimizer=debug"); `RUST_LOG` wins.
    pub log_level: Option<String>,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
