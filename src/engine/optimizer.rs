//! Request orchestration: caches, providers, filtering and search.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::pricing::{rates_for, VehicleRates};
use super::request::OptimizationRequest;
use super::response::{
    Improvements, OptimizationResponse, ResponseMetadata, RouteAlgorithm, RouteResult,
    RoutingSource,
};
use crate::cache::{CacheStats, GraphCache, GraphCacheKey, RouteCache, RouteCacheKey};
use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::cost::{apply_weights, CriterionWeights, DEFAULT_COST_PER_KM, DEFAULT_EMISSIONS_PER_KM};
use crate::error::OptimizeError;
use crate::network::geo::haversine_km;
use crate::network::{BoundingBox, Coordinate, NodeIndex, RoadNetwork, VehicleConstraintFilter};
use crate::observability::metrics;
use crate::pathfinding::{
    alternative_routes, bidirectional_shortest_path, shortest_path, EdgeCost, Path, PathMetrics,
    SearchBudget, SearchError,
};
use crate::provider::{ExternalRoute, NetworkProvider, RouteGeometryProvider};
use crate::resilience::{retry_with_backoff, RetryPolicy};
use crate::vehicle::VehicleProfile;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub search_timeout: Duration,
    pub max_alternatives: usize,
    pub max_snap_distance_km: f64,
    pub bbox_padding_ratio: f64,
    pub bbox_padding_degrees: f64,
    pub graph_cache_bytes: usize,
    pub graph_cache_ttl: Duration,
    pub route_cache_entries: usize,
    pub route_cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_timeout: config.engine.search_timeout(),
            max_alternatives: config.engine.max_alternatives,
            max_snap_distance_km: config.engine.max_snap_distance_km,
            bbox_padding_ratio: config.engine.bbox_padding_ratio,
            bbox_padding_degrees: config.engine.bbox_padding_degrees,
            graph_cache_bytes: config.cache.graph_max_bytes,
            graph_cache_ttl: Duration::from_secs(config.cache.graph_ttl_secs),
            route_cache_entries: config.cache.route_max_entries,
            route_cache_ttl: Duration::from_secs(config.cache.route_ttl_secs),
            retry: RetryPolicy::from(&config.retries),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub graph: CacheStats,
    pub route: CacheStats,
}

pub struct OptimizationEngine {
    provider: Arc<dyn NetworkProvider>,
    geometry: Option<Arc<dyn RouteGeometryProvider>>,
    graph_cache: GraphCache,
    route_cache: RouteCache,
    settings: EngineSettings,
}

impl OptimizationEngine {
    pub fn new(
        provider: Arc<dyn NetworkProvider>,
        settings: EngineSettings,
        clock: SharedClock,
    ) -> Self {
        let graph_cache = GraphCache::new(
            settings.graph_cache_bytes,
            settings.graph_cache_ttl,
            clock.clone(),
        );
        let route_cache = RouteCache::new(
            settings.route_cache_entries,
            settings.route_cache_ttl,
            clock,
        );
        Self {
            provider,
            geometry: None,
            graph_cache,
            route_cache,
            settings,
        }
    }

    /// Use `geometry` when the network provider cannot be reached.
    pub fn with_geometry_provider(mut self, geometry: Arc<dyn RouteGeometryProvider>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            graph: self.graph_cache.stats(),
            route: self.route_cache.stats(),
        }
    }

    pub fn clear_caches(&self) {
        self.graph_cache.clear();
        self.route_cache.clear();
    }

    /// Drop expired graph and route entries. Returns how many were removed.
    pub fn purge_expired_caches(&self) -> usize {
        self.graph_cache.purge_expired() + self.route_cache.purge_expired()
    }

    /// Compute baseline, primary and alternative routes for `request`.
    pub async fn optimize(
        &self,
        request: OptimizationRequest,
    ) -> Result<OptimizationResponse, OptimizeError> {
        let started = Instant::now();
        let result = self.run(request, started).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(response) => {
                metrics::record_optimization("ok", response.metadata.cached, elapsed);
                tracing::info!(
                    criterion = %response.metadata.criterion,
                    vehicle = %response.metadata.vehicle_class,
                    cached = response.metadata.cached,
                    source = ?response.metadata.routing_source,
                    distance_km = response.primary.metrics.distance_km,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Route optimized"
                );
            }
            Err(e) => {
                metrics::record_optimization(e.kind(), false, elapsed);
                tracing::warn!(kind = e.kind(), error = %e, "Route optimization failed");
            }
        }
        result
    }

    async fn run(
        &self,
        request: OptimizationRequest,
        started: Instant,
    ) -> Result<OptimizationResponse, OptimizeError> {
        request.validate()?;
        let weights = request.weights()?;
        let alternatives = request.alternatives.min(self.settings.max_alternatives);

        let cache_key = RouteCacheKey::for_request(&request, alternatives);
        if let Some(hit) = self.route_cache.get(&cache_key) {
            let mut response = (*hit).clone();
            response.metadata.cached = true;
            response.metadata.processing_time_ms = elapsed_ms(started);
            return Ok(response);
        }

        let bbox = BoundingBox::around(
            request.origin,
            request.destination,
            self.settings.bbox_padding_ratio,
            self.settings.bbox_padding_degrees,
        );
        let base = match self.base_network(&bbox).await {
            Ok(base) => base,
            Err(OptimizeError::UpstreamUnavailable(reason)) if self.geometry.is_some() => {
                return self.external_fallback(request, alternatives, reason).await;
            }
            Err(e) => return Err(e),
        };

        // Endpoints resolve against every road in the region, so a vehicle
        // that may not use any of them gets "no route", not a bad request.
        let max_snap = self.settings.max_snap_distance_km;
        let origin = snap(&base, request.origin, "origin", max_snap)?;
        let destination = snap(&base, request.destination, "destination", max_snap)?;

        let network = if origin == destination {
            base
        } else {
            let prepared = self
                .prepared_network(&bbox, base, &request.vehicle, &weights)
                .await?;
            if prepared.edge_count() == 0 {
                return Err(OptimizeError::NoRouteFound(format!(
                    "no roads in the region are usable by a {}",
                    request.vehicle.vehicle_class
                )));
            }
            prepared
        };

        let settings = self.settings.clone();
        let search_request = request.clone();
        let mut response = tokio::task::spawn_blocking(move || {
            search_and_assemble(&network, &search_request, alternatives, &settings)
        })
        .await
        .map_err(|e| OptimizeError::Internal(format!("search task failed: {e}")))??;

        response.metadata.processing_time_ms = elapsed_ms(started);
        self.route_cache.insert(cache_key, Arc::new(response.clone()));
        Ok(response)
    }

    /// Filtered, weighted and prioritized network for a region and vehicle.
    async fn prepared_network(
        &self,
        bbox: &BoundingBox,
        base: Arc<RoadNetwork>,
        vehicle: &VehicleProfile,
        weights: &CriterionWeights,
    ) -> Result<Arc<RoadNetwork>, OptimizeError> {
        let key = GraphCacheKey::prepared(bbox, vehicle, weights);
        if let Some(network) = self.graph_cache.get(&key) {
            return Ok(network);
        }

        let vehicle = vehicle.clone();
        let weights = *weights;
        let prepared = tokio::task::spawn_blocking(move || {
            let filtered = VehicleConstraintFilter::filter(&base, &vehicle);
            let weighted = apply_weights(&filtered, &weights);
            VehicleConstraintFilter::prioritize(weighted, &vehicle)
        })
        .await
        .map_err(|e| OptimizeError::Internal(format!("network preparation failed: {e}")))?;

        let prepared = Arc::new(prepared);
        self.graph_cache.insert(key, prepared.clone());
        Ok(prepared)
    }

    /// Unfiltered network for a region, from cache or the provider.
    async fn base_network(&self, bbox: &BoundingBox) -> Result<Arc<RoadNetwork>, OptimizeError> {
        let key = GraphCacheKey::base(bbox);
        if let Some(network) = self.graph_cache.get(&key) {
            return Ok(network);
        }

        let rows = retry_with_backoff(&self.settings.retry, "load_region", || {
            self.provider.load_region(bbox)
        })
        .await
        .map_err(|e| {
            metrics::record_upstream_failure("network_provider");
            OptimizeError::UpstreamUnavailable(format!("network provider: {e}"))
        })?;

        let network = Arc::new(RoadNetwork::from_rows(&rows)?);
        tracing::debug!(
            nodes = network.node_count(),
            edges = network.edge_count(),
            "Loaded region from provider"
        );
        self.graph_cache.insert(key, network.clone());
        Ok(network)
    }

    async fn external_fallback(
        &self,
        request: OptimizationRequest,
        alternatives: usize,
        reason: String,
    ) -> Result<OptimizationResponse, OptimizeError> {
        let Some(geometry) = &self.geometry else {
            return Err(OptimizeError::UpstreamUnavailable(reason));
        };
        tracing::warn!(%reason, "Network provider unavailable, using external route geometry");

        let routes = retry_with_backoff(&self.settings.retry, "external_routes", || {
            geometry.routes(
                request.origin,
                request.destination,
                &request.vehicle,
                alternatives > 0,
            )
        })
        .await
        .map_err(|e| {
            metrics::record_upstream_failure("route_geometry");
            OptimizeError::UpstreamUnavailable(format!("{reason}; route service: {e}"))
        })?;

        self.optimize_precomputed(request.with_alternatives(alternatives), routes)
    }

    /// Build a response from externally computed routes, without a graph.
    ///
    /// Routes are scored with the same blend the cost model uses per edge.
    /// The best score is primary, the service's first route is the baseline.
    pub fn optimize_precomputed(
        &self,
        request: OptimizationRequest,
        routes: Vec<ExternalRoute>,
    ) -> Result<OptimizationResponse, OptimizeError> {
        let started = Instant::now();
        request.validate()?;
        let weights = request.weights()?;
        if routes.is_empty() {
            return Err(OptimizeError::NoRouteFound(
                "route service returned no routes".to_string(),
            ));
        }

        let scores: Vec<f64> = routes.iter().map(|r| external_score(r, &weights)).collect();
        let best = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let rates = rates_for(request.vehicle.vehicle_class);
        let elapsed = elapsed_ms(started);
        let result = |route: &ExternalRoute, algorithm| external_result(route, algorithm, rates, elapsed);

        let primary = result(&routes[best], RouteAlgorithm::External);
        let baseline = result(&routes[0], RouteAlgorithm::External);
        let alternatives: Vec<RouteResult> = routes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != best && *i != 0)
            .take(request.alternatives.min(self.settings.max_alternatives))
            .map(|(_, r)| result(r, RouteAlgorithm::ExternalAlternative))
            .collect();

        Ok(OptimizationResponse {
            improvements: Improvements::between(&baseline.metrics, &primary.metrics),
            primary,
            baseline,
            alternatives,
            metadata: ResponseMetadata {
                node_count: 0,
                edge_count: 0,
                nodes_explored: 0,
                criterion: request.criterion,
                vehicle_class: request.vehicle.vehicle_class,
                routing_source: RoutingSource::ExternalGeometry,
                cached: false,
                processing_time_ms: elapsed_ms(started),
            },
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Per-route equivalent of the per-edge cost blend, without road-type
/// multipliers.
fn external_score(route: &ExternalRoute, weights: &CriterionWeights) -> f64 {
    let km = route.distance_m / 1000.0;
    let minutes = route.duration_s / 60.0;
    km * weights.distance
        + minutes * weights.time
        + km * DEFAULT_COST_PER_KM * weights.cost
        + km * DEFAULT_EMISSIONS_PER_KM * weights.emissions
}

fn external_result(
    route: &ExternalRoute,
    algorithm: RouteAlgorithm,
    rates: VehicleRates,
    processing_time_ms: u64,
) -> RouteResult {
    RouteResult {
        coordinates: route.coordinates.clone(),
        node_ids: Vec::new(),
        edge_ids: Vec::new(),
        metrics: PathMetrics::from_totals(
            route.distance_m / 1000.0,
            route.duration_s / 60.0,
            rates.cost_per_km,
            rates.emissions_per_km,
        )
        .rounded(),
        confidence: algorithm.confidence(),
        algorithm,
        processing_time_ms,
    }
}

/// Closest node to `at`, rejected when further than the snap limit.
fn snap(
    network: &RoadNetwork,
    at: Coordinate,
    label: &str,
    max_km: f64,
) -> Result<NodeIndex, OptimizeError> {
    let idx = network.nearest_node(at).ok_or_else(|| {
        OptimizeError::InvalidEndpoints(format!("no road nodes near the {label}"))
    })?;
    let distance = haversine_km(at, network.node(idx).coordinate());
    if distance > max_km {
        return Err(OptimizeError::InvalidEndpoints(format!(
            "{label} is {distance:.2} km from the nearest road node, limit is {max_km} km"
        )));
    }
    Ok(idx)
}

/// Snap endpoints, run every search and price the routes. Runs on the
/// blocking pool.
fn search_and_assemble(
    network: &RoadNetwork,
    request: &OptimizationRequest,
    alternatives: usize,
    settings: &EngineSettings,
) -> Result<OptimizationResponse, OptimizeError> {
    // Endpoints already resolved against the unfiltered region; failing here
    // means no usable road is close enough.
    let usable = |at: Coordinate, label: &str| {
        snap(network, at, label, settings.max_snap_distance_km).map_err(|_| {
            OptimizeError::NoRouteFound(format!(
                "no road near the {label} is usable by a {}",
                request.vehicle.vehicle_class
            ))
        })
    };
    let origin = usable(request.origin, "origin")?;
    let destination = usable(request.destination, "destination")?;
    let budget = SearchBudget::new(settings.search_timeout);
    let no_route = || {
        OptimizeError::NoRouteFound(format!(
            "{} and {} are not connected for a {}",
            network.node(origin).id,
            network.node(destination).id,
            request.vehicle.vehicle_class
        ))
    };

    let timer = Instant::now();
    let baseline = bidirectional_shortest_path(network, origin, destination, EdgeCost::Length, &budget)?
        .ok_or_else(no_route)?;
    let baseline_ms = elapsed_ms(timer);

    let timer = Instant::now();
    let primary = shortest_path(network, origin, destination, EdgeCost::Weight, &budget)?
        .ok_or_else(no_route)?;
    let primary_ms = elapsed_ms(timer);

    let validation = VehicleConstraintFilter::validate(network, &primary.nodes, &request.vehicle);
    if !validation.valid {
        tracing::warn!(
            vehicle = %request.vehicle.vehicle_class,
            reason = %validation.reason,
            "Primary route failed vehicle validation"
        );
    }

    let timer = Instant::now();
    let alternative_paths = if alternatives == 0 {
        Vec::new()
    } else {
        match alternative_routes(network, &primary, EdgeCost::Weight, alternatives, &budget) {
            Ok(paths) => paths,
            Err(SearchError::Timeout { explored, .. }) => {
                tracing::warn!(explored, "Alternative search ran out of budget, returning none");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        }
    };
    let alternatives_ms = elapsed_ms(timer);

    let rates = rates_for(request.vehicle.vehicle_class);
    let result = |path: &Path, algorithm: RouteAlgorithm, ms: u64| RouteResult {
        coordinates: path
            .nodes
            .iter()
            .map(|&n| network.node(n).coordinate())
            .collect(),
        node_ids: path.node_ids(network),
        edge_ids: path.edge_ids(network),
        metrics: PathMetrics::from_path_with_rates(
            network,
            path,
            rates.cost_per_km,
            rates.emissions_per_km,
        )
        .rounded(),
        confidence: algorithm.confidence(),
        algorithm,
        processing_time_ms: ms,
    };

    let nodes_explored = baseline.nodes_explored
        + primary.nodes_explored
        + alternative_paths.iter().map(|p| p.nodes_explored).sum::<usize>();
    let primary = result(&primary, RouteAlgorithm::Astar, primary_ms);
    let baseline = result(&baseline, RouteAlgorithm::BidirectionalDijkstra, baseline_ms);
    let alternatives = alternative_paths
        .iter()
        .map(|p| result(p, RouteAlgorithm::AstarAlternative, alternatives_ms))
        .collect();

    Ok(OptimizationResponse {
        improvements: Improvements::between(&baseline.metrics, &primary.metrics),
        primary,
        baseline,
        alternatives,
        metadata: ResponseMetadata {
            node_count: network.node_count(),
            edge_count: network.edge_count(),
            nodes_explored,
            criterion: request.criterion,
            vehicle_class: request.vehicle.vehicle_class,
            routing_source: RoutingSource::InternalGraph,
            cached: false,
            processing_time_ms: 0,
        },
    })
}
