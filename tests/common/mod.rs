//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use route_optimizer::clock::{ManualClock, SharedClock};
use route_optimizer::config::{ApiKeyConfig, RateLimitConfig};
use route_optimizer::engine::{EngineSettings, OptimizationEngine};
use route_optimizer::http::AppState;
use route_optimizer::network::{BoundingBox, Coordinate, EdgeRow, NetworkRows, Node, RoadType};
use route_optimizer::provider::{
    ExternalRoute, NetworkProvider, ProviderError, RouteGeometryProvider, StaticNetworkProvider,
};
use route_optimizer::resilience::RetryPolicy;
use route_optimizer::security::{ApiKeyRegistry, InMemoryUsageStore, RateLimiter};
use route_optimizer::vehicle::VehicleProfile;

/// 2023-11-14T22:13:00Z, aligned to a minute boundary.
pub const T0: u64 = 1_699_999_980_000;

pub const ORIGIN: Coordinate = Coordinate { lat: 52.50, lng: 13.40 };
pub const DESTINATION: Coordinate = Coordinate { lat: 52.50, lng: 13.42 };

/// Two ways from `a` to `b`: a short slow residential street through `m1`
/// and a longer fast motorway through `m2`.
pub fn two_route_rows() -> NetworkRows {
    NetworkRows {
        nodes: vec![
            Node::new("a", ORIGIN.lat, ORIGIN.lng),
            Node::new("m1", 52.4995, 13.41),
            Node::new("m2", 52.505, 13.41),
            Node::new("b", DESTINATION.lat, DESTINATION.lng),
        ],
        edges: vec![
            EdgeRow::new("a-m1", "a", "m1", 900.0, RoadType::Residential).with_speed(30.0),
            EdgeRow::new("m1-b", "m1", "b", 900.0, RoadType::Residential).with_speed(30.0),
            EdgeRow::new("a-m2", "a", "m2", 1500.0, RoadType::Motorway).with_speed(120.0),
            EdgeRow::new("m2-b", "m2", "b", 1500.0, RoadType::Motorway).with_speed(120.0),
        ],
    }
}

/// Only residential streets between `a` and `b`.
pub fn residential_rows() -> NetworkRows {
    let mut rows = two_route_rows();
    rows.edges.retain(|e| e.road_type == RoadType::Residential);
    rows.nodes.retain(|n| n.id != "m2");
    rows
}

/// A single primary road from `a` to `b`.
pub fn two_node_rows() -> NetworkRows {
    NetworkRows {
        nodes: vec![
            Node::new("a", ORIGIN.lat, ORIGIN.lng),
            Node::new("b", DESTINATION.lat, DESTINATION.lng),
        ],
        edges: vec![EdgeRow::new("ab", "a", "b", 1400.0, RoadType::Primary)],
    }
}

/// Two roads joining the same pair of nodes: a short crawl and a long
/// fast bypass.
pub fn parallel_rows() -> NetworkRows {
    NetworkRows {
        nodes: vec![
            Node::new("a", ORIGIN.lat, ORIGIN.lng),
            Node::new("b", DESTINATION.lat, DESTINATION.lng),
        ],
        edges: vec![
            EdgeRow::new("short_slow", "a", "b", 1400.0, RoadType::Primary).with_speed(10.0),
            EdgeRow::new("long_fast", "a", "b", 3000.0, RoadType::Motorway).with_speed(120.0),
        ],
    }
}

/// Two islands with no road between them.
pub fn disconnected_rows() -> NetworkRows {
    NetworkRows {
        nodes: vec![
            Node::new("p1", 52.52, 13.40),
            Node::new("p2", 52.52, 13.41),
            Node::new("q1", 52.53, 13.40),
            Node::new("q2", 52.53, 13.41),
        ],
        edges: vec![
            EdgeRow::new("p", "p1", "p2", 800.0, RoadType::Primary),
            EdgeRow::new("q", "q1", "q2", 800.0, RoadType::Primary),
        ],
    }
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(T0))
}

pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        retry: RetryPolicy::once(Duration::from_millis(200)),
        ..EngineSettings::default()
    }
}

pub fn engine_for(rows: &NetworkRows) -> OptimizationEngine {
    let provider = StaticNetworkProvider::from_rows(rows).expect("fixture network is valid");
    OptimizationEngine::new(Arc::new(provider), fast_settings(), manual_clock())
}

pub fn car() -> VehicleProfile {
    VehicleProfile::car()
}

/// A provider that is always down.
pub struct OfflineProvider;

#[async_trait]
impl NetworkProvider for OfflineProvider {
    async fn load_region(&self, _bbox: &BoundingBox) -> Result<NetworkRows, ProviderError> {
        Err(ProviderError::Unavailable("connection refused".into()))
    }
}

/// Returns the same canned routes for every request.
pub struct CannedRoutes(pub Vec<ExternalRoute>);

#[async_trait]
impl RouteGeometryProvider for CannedRoutes {
    async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        _vehicle: &VehicleProfile,
        _alternatives: bool,
    ) -> Result<Vec<ExternalRoute>, ProviderError> {
        Ok(self
            .0
            .iter()
            .cloned()
            .map(|mut r| {
                r.coordinates = vec![origin, destination];
                r
            })
            .collect())
    }
}

pub const STARTER_KEY: &str = "starter-secret";
pub const ENTERPRISE_KEY: &str = "enterprise-secret";

/// Application state over `rows` with one starter and one enterprise key.
pub fn app_state(rows: &NetworkRows) -> AppState {
    let clock: SharedClock = manual_clock();
    let provider = StaticNetworkProvider::from_rows(rows).expect("fixture network is valid");
    let engine = OptimizationEngine::new(Arc::new(provider), fast_settings(), clock.clone());
    let limiter = RateLimiter::new(
        &RateLimitConfig::default(),
        Arc::new(InMemoryUsageStore::new()),
        clock.clone(),
    );
    let api_keys = ApiKeyRegistry::from_config(&[
        ApiKeyConfig {
            key: STARTER_KEY.into(),
            id: "starter-client".into(),
            tier: "starter".into(),
        },
        ApiKeyConfig {
            key: ENTERPRISE_KEY.into(),
            id: "enterprise-client".into(),
            tier: "enterprise".into(),
        },
    ]);
    AppState {
        engine: Arc::new(engine),
        limiter: Arc::new(limiter),
        api_keys: Arc::new(api_keys),
        rate_limit_enabled: true,
        clock,
        started_at: Instant::now(),
    }
}
