//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (API keys reference existing tiers)
//! - Validate value ranges (timeouts > 0, addresses parse, URLs are http(s))
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AppConfig;
use crate::security::Strategy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    let engine = &config.engine;
    if engine.search_timeout_ms == 0 {
        errors.push(ValidationError::new("engine.search_timeout_ms", "must be > 0"));
    }
    if !(engine.max_snap_distance_km.is_finite() && engine.max_snap_distance_km > 0.0) {
        errors.push(ValidationError::new(
            "engine.max_snap_distance_km",
            "must be a positive number",
        ));
    }
    if !(engine.bbox_padding_ratio.is_finite() && engine.bbox_padding_ratio >= 0.0) {
        errors.push(ValidationError::new("engine.bbox_padding_ratio", "must be >= 0"));
    }
    if !(engine.bbox_padding_degrees.is_finite() && engine.bbox_padding_degrees >= 0.0) {
        errors.push(ValidationError::new("engine.bbox_padding_degrees", "must be >= 0"));
    }

    let cache = &config.cache;
    for (field, value) in [
        ("cache.graph_max_bytes", cache.graph_max_bytes as u64),
        ("cache.graph_ttl_secs", cache.graph_ttl_secs),
        ("cache.route_max_entries", cache.route_max_entries as u64),
        ("cache.route_ttl_secs", cache.route_ttl_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.store_timeout_ms == 0 {
        errors.push(ValidationError::new("rate_limit.store_timeout_ms", "must be > 0"));
    }
    if rate_limit.cas_attempts == 0 {
        errors.push(ValidationError::new("rate_limit.cas_attempts", "must be > 0"));
    }
    if !rate_limit.tiers.contains_key("starter") {
        errors.push(ValidationError::new(
            "rate_limit.tiers",
            "a 'starter' tier is required as the fallback",
        ));
    }
    for (name, tier) in &rate_limit.tiers {
        if tier.requests_per_minute == 0 {
            errors.push(ValidationError::new(
                format!("rate_limit.tiers.{name}.requests_per_minute"),
                "must be > 0",
            ));
        }
        if tier.strategy == Strategy::FailOpen {
            errors.push(ValidationError::new(
                format!("rate_limit.tiers.{name}.strategy"),
                "fail_open is not a configurable strategy",
            ));
        }
    }

    let external = &config.external_routing;
    if external.enabled {
        match Url::parse(&external.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "external_routing.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "external_routing.base_url",
                e.to_string(),
            )),
        }
        if external.timeout_ms == 0 {
            errors.push(ValidationError::new("external_routing.timeout_ms", "must be > 0"));
        }
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if retries.attempt_timeout_ms == 0 {
        errors.push(ValidationError::new("retries.attempt_timeout_ms", "must be > 0"));
    }

    let mut seen = HashSet::new();
    for (i, key) in config.api_keys.iter().enumerate() {
        if key.key.trim().is_empty() || key.id.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("api_keys[{i}]"),
                "key and id must be non-empty",
            ));
        }
        if !seen.insert(key.key.as_str()) {
            errors.push(ValidationError::new(
                format!("api_keys[{i}].key"),
                "duplicate key",
            ));
        }
        if !rate_limit.tiers.contains_key(&key.tier) {
            errors.push(ValidationError::new(
                format!("api_keys[{i}].tier"),
                format!("unknown tier '{}'", key.tier),
            ));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ApiKeyConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        config.engine.max_snap_distance_km = -1.0;
        config.retries.max_attempts = 0;
        config.rate_limit.tiers.remove("starter");

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "engine.max_snap_distance_km",
                "rate_limit.tiers",
                "retries.max_attempts",
            ]
        );
    }

    #[test]
    fn test_external_url_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.external_routing.base_url = "ftp://osrm".into();
        assert!(validate_config(&config).is_ok());

        config.external_routing.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "external_routing.base_url");
    }

    #[test]
    fn test_api_keys_reference_known_tiers() {
        let mut config = AppConfig::default();
        config.api_keys = vec![
            ApiKeyConfig {
                key: "k1".into(),
                id: "a".into(),
                tier: "gold".into(),
            },
            ApiKeyConfig {
                key: "k1".into(),
                id: "b".into(),
                tier: "starter".into(),
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "api_keys[0].tier");
        assert_eq!(errors[1].field, "api_keys[1].key");
    }
}
