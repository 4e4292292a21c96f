//! Structured logging.
//!
//! # Design Decisions
//! - Uses `tracing` with an `EnvFilter`; `RUST_LOG` wins over config
//! - Compact human format by default, JSON when configured

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

pub const DEFAULT_FILTER: &str = "route_optimizer=info,tower_http=info";

/// Build the filter: `RUST_LOG` if set, then the configured level, then the default.
pub fn env_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
        Some(level) if !level.trim().is_empty() => {
            EnvFilter::try_new(level).unwrap_or_else(|_| DEFAULT_FILTER.into())
        }
        _ => DEFAULT_FILTER.into(),
    })
}

/// Install the global subscriber. Safe to call once per process.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = env_filter(config.log_level.as_deref());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        // Only meaningful when RUST_LOG is unset in the test environment.
        if std::env::var("RUST_LOG").is_err() {
            let filter = env_filter(Some("[[[not a filter"));
            assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
        }
    }
}
