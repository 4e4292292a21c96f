//! OSRM `route/v1` client used as a geometry fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{ExternalRoute, ProviderError, RouteGeometryProvider};
use crate::config::ExternalRoutingConfig;
use crate::network::Coordinate;
use crate::vehicle::{VehicleClass, VehicleProfile};

pub const USER_AGENT: &str = concat!("route-optimizer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: Geometry,
}

/// GeoJSON LineString with `[lng, lat]` positions.
#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

impl From<OsrmRoute> for ExternalRoute {
    fn from(route: OsrmRoute) -> Self {
        Self {
            coordinates: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinate::new(lat, lng))
                .collect(),
            distance_m: route.distance,
            duration_s: route.duration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: Url,
}

impl OsrmClient {
    pub fn new(config: &ExternalRoutingConfig) -> Result<Self, ProviderError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::Malformed(format!("OSRM base URL: {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::Upstream(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// OSRM profile name for a vehicle.
    pub fn profile(vehicle: &VehicleProfile) -> &'static str {
        match vehicle.vehicle_class {
            VehicleClass::Bicycle => "bike",
            _ => "car",
        }
    }

    /// `{base}/route/v1/{profile}/{lng},{lat};{lng},{lat}?overview=full&geometries=geojson&alternatives=..`
    pub fn route_url(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        profile: &str,
        alternatives: bool,
    ) -> Result<Url, ProviderError> {
        let coords = format!(
            "{},{};{},{}",
            origin.lng, origin.lat, destination.lng, destination.lat
        );
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Malformed(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["route", "v1", profile, &coords]);
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson")
            .append_pair("alternatives", if alternatives { "true" } else { "false" });
        Ok(url)
    }
}

#[async_trait]
impl RouteGeometryProvider for OsrmClient {
    async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        vehicle: &VehicleProfile,
        alternatives: bool,
    ) -> Result<Vec<ExternalRoute>, ProviderError> {
        let url = self.route_url(origin, destination, Self::profile(vehicle), alternatives)?;
        let http_error = |e: reqwest::Error| ProviderError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        let body: RouteResponse = response.json().await.map_err(http_error)?;
        parse_routes(body)
    }
}

fn parse_routes(body: RouteResponse) -> Result<Vec<ExternalRoute>, ProviderError> {
    if body.code != "Ok" {
        return Err(ProviderError::Upstream(format!(
            "{}: {}",
            body.code,
            body.message.unwrap_or_else(|| "unknown error".to_string())
        )));
    }
    if body.routes.is_empty() {
        return Err(ProviderError::Upstream("no routes returned".to_string()));
    }
    Ok(body.routes.into_iter().map(ExternalRoute::from).collect())
}
