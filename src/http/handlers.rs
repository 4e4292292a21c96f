//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use super::request::{request_id, OptimizeRouteBody, UsageQuery};
use super::response::{apply_rate_limit_headers, error_response};
use super::server::AppState;
use crate::engine::EngineCacheStats;
use crate::observability::metrics;
use crate::security::{ApiPrincipal, UsageRecord};

pub const HEALTH_ENDPOINT: &str = "/health";
pub const OPTIMIZE_ENDPOINT: &str = "/v1/optimize-route";
pub const USAGE_ENDPOINT: &str = "/v1/usage";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub caches: EngineCacheStats,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        caches: state.engine.cache_stats(),
    })
}

/// Rate-limit, optimize, then record usage.
pub async fn optimize_route(
    State(state): State<AppState>,
    Extension(principal): Extension<ApiPrincipal>,
    headers: HeaderMap,
    body: Result<Json<OptimizeRouteBody>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers).to_string();

    let quota = if state.rate_limit_enabled {
        Some(
            state
                .limiter
                .check_limit(&principal.id, &principal.tier, OPTIMIZE_ENDPOINT)
                .await,
        )
    } else {
        None
    };

    let mut response = match (&quota, body) {
        (Some(q), _) if !q.allowed => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            format!("rate limit of {} requests per minute exceeded", q.limit),
        ),
        (_, Err(rejection)) => error_response(
            rejection.status(),
            "invalid_request_body",
            rejection.body_text(),
        ),
        (_, Ok(Json(body))) => {
            tracing::debug!(%request_id, api_key_id = %principal.id, "Optimizing route");
            match state.engine.optimize(body.into_request()).await {
                Ok(optimized) => Json(optimized).into_response(),
                Err(e) => e.into_response(),
            }
        }
    };

    if let Some(q) = &quota {
        apply_rate_limit_headers(&mut response, q);
    }

    let status = response.status();
    let elapsed = started.elapsed();
    state
        .limiter
        .record_usage(UsageRecord {
            api_key_id: principal.id.clone(),
            endpoint: OPTIMIZE_ENDPOINT.to_string(),
            timestamp_millis: state.clock.now_millis(),
            success: status.is_success(),
            status: status.as_u16(),
            response_time_ms: elapsed.as_millis() as u64,
        })
        .await;
    metrics::record_request(OPTIMIZE_ENDPOINT, status.as_u16(), elapsed);
    tracing::info!(
        %request_id,
        api_key_id = %principal.id,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Handled optimize-route"
    );
    response
}

/// Usage summary for the calling key.
pub async fn usage(
    State(state): State<AppState>,
    Extension(principal): Extension<ApiPrincipal>,
    Query(query): Query<UsageQuery>,
) -> Response {
    let started = Instant::now();
    let response = match state
        .limiter
        .usage_summary(&principal.id, &principal.tier, query.hours())
        .await
    {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::warn!(api_key_id = %principal.id, error = %e, "Usage summary unavailable");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_unavailable",
                "usage data is temporarily unavailable",
            )
        }
    };
    metrics::record_request(USAGE_ENDPOINT, response.status().as_u16(), started.elapsed());
    response
}
