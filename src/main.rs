//! Route Optimizer (v1)
//!
//! An HTTP service computing vehicle-aware routes over a road network.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (request id, trace, timeout, body limit)
//!                       │
//!                       ▼
//!                     security (API key → tier → rate limit)
//!                       │
//!                       ▼
//!                     engine ──▶ cache (route, graph)
//!                       │
//!                       ├──▶ provider (road network rows, OSRM fallback)
//!                       ├──▶ network filter + cost model
//!                       └──▶ pathfinding (A*, bidirectional, alternatives)
//!                       │
//!     Client Response   ▼
//!     ◀────────────── primary + baseline + alternatives + improvements
//! ```
//!
//! Configuration is read from the TOML file named by the first argument or
//! `ROUTE_OPTIMIZER_CONFIG`; built-in defaults apply when neither is given.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use route_optimizer::clock::SystemClock;
use route_optimizer::config::{load_config, AppConfig};
use route_optimizer::http::HttpServer;
use route_optimizer::lifecycle::{
    build_state, spawn_maintenance, startup, wait_for_signal, Shutdown,
};
use route_optimizer::observability::{logging, metrics};

const CONFIG_ENV: &str = "ROUTE_OPTIMIZER_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-optimizer starting");

    tracing::info!(
        config = ?config_path,
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = build_state(&config, Arc::new(SystemClock))?;
    let shutdown = Shutdown::new();

    let maintenance = spawn_maintenance(
        state.engine.clone(),
        state.limiter.clone(),
        startup::MAINTENANCE_INTERVAL,
        startup::USAGE_RETENTION,
        shutdown.subscribe(),
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(state, &config.server);
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            shutdown.trigger();
            result??;
        }
    }
    let _ = maintenance.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
