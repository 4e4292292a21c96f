//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_optimizer_requests_total` (counter): HTTP requests by route, status
//! - `route_optimizer_request_duration_seconds` (histogram): HTTP latency
//! - `route_optimizer_optimizations_total` (counter): engine outcomes by kind
//! - `route_optimizer_optimization_duration_seconds` (histogram): engine latency
//! - `route_optimizer_cache_lookups_total` (counter): hits/misses by cache
//! - `route_optimizer_cache_evictions_total` (counter): evictions by cache
//! - `route_optimizer_rate_limit_decisions_total` (counter): by tier, strategy, outcome
//! - `route_optimizer_rate_limit_store_failures_total` (counter)
//! - `route_optimizer_upstream_failures_total` (counter): by dependency
//! - `route_optimizer_retries_total` (counter): by operation
//!
//! # Design Decisions
//! - Label values are `'static` strings where possible
//! - The Prometheus exporter is optional; without it every call is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_request(route: &'static str, status: u16, elapsed: Duration) {
    counter!(
        "route_optimizer_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("route_optimizer_request_duration_seconds", "route" => route)
        .record(elapsed.as_secs_f64());
}

/// `outcome` is `ok` or an error kind label.
pub fn record_optimization(outcome: &'static str, cached: bool, elapsed: Duration) {
    counter!(
        "route_optimizer_optimizations_total",
        "outcome" => outcome,
        "cached" => if cached { "true" } else { "false" }
    )
    .increment(1);
    if !cached {
        histogram!("route_optimizer_optimization_duration_seconds").record(elapsed.as_secs_f64());
    }
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    counter!(
        "route_optimizer_cache_lookups_total",
        "cache" => cache,
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_cache_evictions(cache: &'static str, count: u64) {
    if count > 0 {
        counter!("route_optimizer_cache_evictions_total", "cache" => cache).increment(count);
    }
}

pub fn record_rate_limit_decision(tier: &str, strategy: &'static str, allowed: bool) {
    counter!(
        "route_optimizer_rate_limit_decisions_total",
        "tier" => tier.to_string(),
        "strategy" => strategy,
        "outcome" => if allowed { "allowed" } else { "denied" }
    )
    .increment(1);
}

pub fn record_rate_limit_store_failure() {
    counter!("route_optimizer_rate_limit_store_failures_total").increment(1);
}

pub fn record_upstream_failure(dependency: &'static str) {
    counter!("route_optimizer_upstream_failures_total", "dependency" => dependency).increment(1);
}

pub fn record_retry(operation: &'static str) {
    counter!("route_optimizer_retries_total", "operation" => operation).increment(1);
}
