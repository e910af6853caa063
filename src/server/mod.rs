//! HTTP Server
//!
//! Routes:
//!
//! ```text
//! /
//! ├── /contacts   - paginated contacts, gated by the daily view quota
//! ├── /agencies   - paginated agencies
//! ├── /health     - liveness probe
//! └── /metrics    - Prometheus scrape endpoint
//! ```
//!
//! Handlers share only immutable state; the per-user quota counter travels
//! in a cookie, so any replica can serve any request.

pub mod cookies;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::directory::{DatasetProvider, FileDatasetProvider};
use crate::metrics;
use crate::service::DirectoryService;

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<DirectoryService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assemble state from its parts
    pub fn new(config: Config, provider: Arc<dyn DatasetProvider>, clock: Arc<dyn Clock>) -> Self {
        let service = DirectoryService::new(
            provider,
            config.quota.daily_limit,
            config.quota.contacts_page_size,
            config.directory.agencies_page_size,
        );

        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            clock,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/contacts", get(handlers::list_contacts))
        .route("/agencies", get(handlers::list_agencies))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .with_state(state)
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    metrics::observe_request(
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    metrics::init().context("Failed to initialize metrics")?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    let provider = Arc::new(FileDatasetProvider::new(
        &config.directory.data_dir,
        &config.directory.agencies_file,
        &config.directory.contacts_file,
    ));
    if let Err(e) = provider.preload().await {
        // Requests retry the load; the service still starts
        warn!(error = %e, "Dataset preload failed");
    }

    let state = AppState::new(config, provider, Arc::new(SystemClock));
    let app = build_router(state);

    info!("Starting directory server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind directory server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Directory server error")?;

    info!("Directory server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
