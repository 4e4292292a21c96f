//! End-to-end optimization scenarios over small fixture networks.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use route_optimizer::cost::Criterion;
use route_optimizer::engine::{OptimizationEngine, OptimizationRequest, RouteAlgorithm, RoutingSource};
use route_optimizer::network::Coordinate;
use route_optimizer::provider::{ExternalRoute, StaticNetworkProvider};
use route_optimizer::vehicle::VehicleProfile;
use route_optimizer::OptimizeError;

mod common;

use common::{car, engine_for, fast_settings, manual_clock, DESTINATION, ORIGIN};

fn request(vehicle: VehicleProfile, criterion: Criterion) -> OptimizationRequest {
    OptimizationRequest::new(ORIGIN, DESTINATION, vehicle).with_criterion(criterion)
}

#[tokio::test]
async fn test_time_criterion_prefers_motorway() {
    let engine = engine_for(&common::two_route_rows());
    let response = engine.optimize(request(car(), Criterion::Time)).await.unwrap();

    assert_eq!(response.primary.node_ids, vec!["a", "m2", "b"]);
    assert_eq!(response.primary.algorithm, RouteAlgorithm::Astar);
    assert_eq!(response.baseline.node_ids, vec!["a", "m1", "b"]);
    assert_eq!(response.baseline.algorithm, RouteAlgorithm::BidirectionalDijkstra);
    assert_eq!(response.primary.metrics.distance_km, 3.0);
    assert_eq!(response.baseline.metrics.distance_km, 1.8);
    assert!(response.improvements.time_saved_minutes > 0.0);
    assert_eq!(response.improvements.distance_saved_km, 0.0);
    assert_eq!(response.metadata.routing_source, RoutingSource::InternalGraph);
    assert!(!response.metadata.cached);
}

#[tokio::test]
async fn test_distance_criterion_prefers_short_street() {
    let engine = engine_for(&common::two_route_rows());
    let response = engine
        .optimize(request(car(), Criterion::Distance))
        .await
        .unwrap();

    assert_eq!(response.primary.node_ids, vec!["a", "m1", "b"]);
    assert_eq!(response.primary.edge_ids, vec!["a-m1", "m1-b"]);
    assert_eq!(response.primary.coordinates.first(), Some(&ORIGIN));
    assert_eq!(response.improvements.distance_saved_km, 0.0);
}

#[rstest]
#[case(Criterion::Distance)]
#[case(Criterion::Time)]
#[case(Criterion::Cost)]
#[case(Criterion::Emissions)]
#[case(Criterion::Balanced)]
#[tokio::test]
async fn test_improvements_never_negative(#[case] criterion: Criterion) {
    let engine = engine_for(&common::two_route_rows());
    let response = engine.optimize(request(car(), criterion)).await.unwrap();
    let imp = response.improvements;

    assert!(imp.distance_saved_km >= 0.0);
    assert!(imp.time_saved_minutes >= 0.0);
    assert!(imp.cost_saved_usd >= 0.0);
    assert!(imp.emissions_saved_kg >= 0.0);
    assert_eq!(response.metadata.criterion, criterion);
}

#[tokio::test]
async fn test_alternatives_differ_from_primary() {
    let engine = engine_for(&common::two_route_rows());
    let response = engine
        .optimize(request(car(), Criterion::Time).with_alternatives(2))
        .await
        .unwrap();

    assert!(response.alternatives.len() <= 2);
    for alt in &response.alternatives {
        assert_ne!(alt.node_ids, response.primary.node_ids);
        assert_eq!(alt.algorithm, RouteAlgorithm::AstarAlternative);
    }
}

#[tokio::test]
async fn test_disconnected_graph_reports_no_route() {
    let engine = engine_for(&common::disconnected_rows());
    let err = engine
        .optimize(OptimizationRequest::new(
            Coordinate::new(52.52, 13.40),
            Coordinate::new(52.53, 13.41),
            car(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::NoRouteFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_truck_on_residential_streets_reports_no_route() {
    let engine = engine_for(&common::residential_rows());
    let err = engine
        .optimize(request(VehicleProfile::truck(), Criterion::Balanced))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::NoRouteFound(_)), "{err:?}");

    // A van may use the same streets.
    let van = engine
        .optimize(request(VehicleProfile::van(), Criterion::Balanced))
        .await
        .unwrap();
    assert_eq!(van.primary.node_ids, vec!["a", "m1", "b"]);
}

#[tokio::test]
async fn test_truck_takes_motorway() {
    let engine = engine_for(&common::two_route_rows());
    let response = engine
        .optimize(request(VehicleProfile::truck(), Criterion::Distance))
        .await
        .unwrap();
    assert_eq!(response.primary.node_ids, vec!["a", "m2", "b"]);
    assert_eq!(response.baseline.node_ids, vec!["a", "m2", "b"]);
}

#[tokio::test]
async fn test_far_endpoint_is_rejected() {
    let engine = engine_for(&common::two_route_rows());
    let err = engine
        .optimize(OptimizationRequest::new(
            Coordinate::new(52.0, 13.40),
            DESTINATION,
            car(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::InvalidEndpoints(_)), "{err:?}");
}

#[tokio::test]
async fn test_endpoints_far_from_every_road_are_rejected() {
    let engine = engine_for(&common::two_node_rows());
    let err = engine
        .optimize(OptimizationRequest::new(
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.01, 10.01),
            car(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::InvalidEndpoints(_)), "{err:?}");
}

#[tokio::test]
async fn test_same_origin_and_destination_is_a_zero_length_route() {
    let engine = engine_for(&common::two_node_rows());
    let response = engine
        .optimize(OptimizationRequest::new(ORIGIN, ORIGIN, car()))
        .await
        .unwrap();

    assert_eq!(response.primary.node_ids, vec!["a"]);
    assert!(response.primary.edge_ids.is_empty());
    assert_eq!(response.primary.metrics.distance_km, 0.0);
    assert_eq!(response.baseline.node_ids, vec!["a"]);
    assert!(response.alternatives.is_empty());
}

#[tokio::test]
async fn test_parallel_roads_are_chosen_by_criterion() {
    let engine = engine_for(&common::parallel_rows());
    let shortest = engine.optimize(request(car(), Criterion::Distance)).await.unwrap();
    let fastest = engine.optimize(request(car(), Criterion::Time)).await.unwrap();

    assert_eq!(shortest.primary.node_ids, vec!["a", "b"]);
    assert_eq!(fastest.primary.node_ids, shortest.primary.node_ids);
    assert_eq!(shortest.primary.edge_ids, vec!["short_slow"]);
    assert_eq!(fastest.primary.edge_ids, vec!["long_fast"]);
}

#[tokio::test]
async fn test_out_of_range_coordinate_is_rejected() {
    let engine = engine_for(&common::two_route_rows());
    let err = engine
        .optimize(OptimizationRequest::new(
            Coordinate::new(95.0, 13.40),
            DESTINATION,
            car(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::Configuration(_)), "{err:?}");
}

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let engine = engine_for(&common::two_route_rows());
    let first = engine.optimize(request(car(), Criterion::Time)).await.unwrap();
    let second = engine.optimize(request(car(), Criterion::Time)).await.unwrap();

    assert!(!first.metadata.cached);
    assert!(second.metadata.cached);
    assert_eq!(first.primary, second.primary);
    assert_eq!(engine.cache_stats().route.hits, 1);

    // A different criterion misses the route cache but reuses the region.
    engine.optimize(request(car(), Criterion::Cost)).await.unwrap();
    let stats = engine.cache_stats();
    assert_eq!(stats.route.entries, 2);
    assert!(stats.graph.hits >= 1);

    engine.clear_caches();
    assert_eq!(engine.cache_stats().route.entries, 0);
}

#[tokio::test]
async fn test_expired_cache_entries_are_purged() {
    let clock = manual_clock();
    let provider = StaticNetworkProvider::from_rows(&common::two_route_rows()).unwrap();
    let engine = OptimizationEngine::new(Arc::new(provider), fast_settings(), clock.clone());
    engine.optimize(request(car(), Criterion::Time)).await.unwrap();
    assert_eq!(engine.purge_expired_caches(), 0);

    clock.advance(Duration::from_secs(3_600));
    // Route entry plus the base and prepared regions.
    assert_eq!(engine.purge_expired_caches(), 3);
    let stats = engine.cache_stats();
    assert_eq!(stats.route.entries, 0);
    assert_eq!(stats.graph.entries, 0);
}

#[tokio::test]
async fn test_results_are_deterministic() {
    let rows = common::two_route_rows();
    let a = engine_for(&rows)
        .optimize(request(car(), Criterion::Balanced))
        .await
        .unwrap();
    let b = engine_for(&rows)
        .optimize(request(car(), Criterion::Balanced))
        .await
        .unwrap();

    assert_eq!(a.primary.node_ids, b.primary.node_ids);
    assert_eq!(a.primary.metrics, b.primary.metrics);
    assert_eq!(a.baseline.node_ids, b.baseline.node_ids);
    assert_eq!(a.improvements, b.improvements);
}

#[tokio::test]
async fn test_provider_outage_falls_back_to_external_routes() {
    let geometry = common::CannedRoutes(vec![
        ExternalRoute {
            coordinates: Vec::new(),
            distance_m: 2_000.0,
            duration_s: 400.0,
        },
        ExternalRoute {
            coordinates: Vec::new(),
            distance_m: 2_500.0,
            duration_s: 200.0,
        },
    ]);
    let engine = OptimizationEngine::new(
        Arc::new(common::OfflineProvider),
        fast_settings(),
        manual_clock(),
    )
    .with_geometry_provider(Arc::new(geometry));

    let response = engine.optimize(request(car(), Criterion::Time)).await.unwrap();
    assert_eq!(response.metadata.routing_source, RoutingSource::ExternalGeometry);
    assert_eq!(response.primary.algorithm, RouteAlgorithm::External);
    assert_eq!(response.primary.metrics.distance_km, 2.5);
    assert_eq!(response.baseline.metrics.distance_km, 2.0);
    assert_eq!(response.primary.coordinates, vec![ORIGIN, DESTINATION]);
}

#[tokio::test]
async fn test_provider_outage_without_fallback_is_upstream_error() {
    let engine = OptimizationEngine::new(
        Arc::new(common::OfflineProvider),
        fast_settings(),
        manual_clock(),
    );
    let err = engine.optimize(request(car(), Criterion::Time)).await.unwrap_err();
    assert!(matches!(err, OptimizeError::UpstreamUnavailable(_)), "{err:?}");
}
