//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, API keys)
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{health, optimize_route, usage, HEALTH_ENDPOINT, OPTIMIZE_ENDPOINT, USAGE_ENDPOINT};
use super::request::request_id;
use crate::clock::SharedClock;
use crate::config::ServerConfig;
use crate::engine::OptimizationEngine;
use crate::security::{require_api_key, ApiKeyRegistry, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<OptimizationEngine>,
    pub limiter: Arc<RateLimiter>,
    pub api_keys: Arc<ApiKeyRegistry>,
    pub rate_limit_enabled: bool,
    pub clock: SharedClock,
    pub started_at: Instant,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let protected = Router::new()
        .route(OPTIMIZE_ENDPOINT, post(optimize_route))
        .route(USAGE_ENDPOINT, get(usage))
        .route_layer(middleware::from_fn_with_state(
            state.api_keys.clone(),
            require_api_key,
        ));

    Router::new()
        .route(HEALTH_ENDPOINT, get(health))
        .merge(protected)
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req.headers()),
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP server for the route optimizer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
