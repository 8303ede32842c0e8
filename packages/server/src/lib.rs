#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Actix-Web API server for the safewatch application.
//!
//! Serves the REST API for submitting incidents and alerts, querying
//! dashboard metrics and analytics reports, and streaming metrics updates
//! over SSE. Aggregation runs against the in-memory store; a background
//! refresh loop recomputes the global snapshot on a fixed period and
//! pushes it to stream subscribers.

mod handlers;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safewatch_metrics::cache::{DEFAULT_TTL_MS, SnapshotCache};
use safewatch_metrics::publish::{BroadcastPublisher, Publisher};
use safewatch_metrics::refresh::{DEFAULT_PERIOD, RefreshLoop};
use safewatch_metrics::service::{AnalyticsService, MetricsService};
use safewatch_store::ReportStore;
use safewatch_store::memory::MemoryStore;

/// Shared application state.
pub struct AppState {
    /// Document store used by submissions and incident queries.
    pub store: Arc<dyn ReportStore>,
    /// Cache-through dashboard snapshot service.
    pub metrics: Arc<MetricsService>,
    /// One-shot analytics and safety service.
    pub analytics: Arc<AnalyticsService>,
    /// Broadcast sink the refresh loop publishes to and the SSE stream
    /// reads from.
    pub publisher: Arc<BroadcastPublisher>,
}

/// Server configuration assembled from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Bind port (`PORT`, default 8080).
    pub port: u16,
    /// Snapshot cache TTL in milliseconds (`METRICS_CACHE_TTL_MS`).
    pub cache_ttl_ms: i64,
    /// Refresh loop period in seconds (`METRICS_REFRESH_SECS`).
    pub refresh_secs: u64,
    /// Whether the background refresh loop runs. Disabled when
    /// `APP_ENV=test` so tests control recomputation themselves.
    pub refresh_enabled: bool,
}

impl ServerConfig {
    /// Reads the configuration from the environment, applying defaults
    /// for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let cache_ttl_ms = std::env::var("METRICS_CACHE_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MS);
        let refresh_secs = std::env::var("METRICS_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| DEFAULT_PERIOD.as_secs());
        let refresh_enabled = std::env::var("APP_ENV").map_or(true, |v| v != "test");
        Self {
            bind_addr,
            port,
            cache_ttl_ms,
            refresh_secs,
            refresh_enabled,
        }
    }
}

/// Registers the `/api` route table.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/incidents", web::get().to(handlers::list_incidents))
            .route("/incidents", web::post().to(handlers::submit_incident))
            .route("/alerts", web::post().to(handlers::submit_alert))
            .route(
                "/metrics/dashboard",
                web::get().to(handlers::dashboard_metrics),
            )
            .route("/metrics/stream", web::get().to(handlers::metrics_stream))
            .route(
                "/analytics/incidents",
                web::get().to(handlers::incident_analytics),
            )
            .route(
                "/analytics/safety-score",
                web::get().to(handlers::safety_score),
            )
            .route(
                "/analytics/safety-report",
                web::get().to(handlers::safety_report),
            )
            .route(
                "/admin/cache/clear",
                web::post().to(handlers::clear_metrics_cache),
            ),
    );
}

/// Starts the safewatch API server.
///
/// Builds the store, the metrics and analytics services, and the
/// broadcast publisher; starts the background refresh loop when enabled;
/// then runs the Actix-Web HTTP server. This is a regular async function
/// — the caller provides the async runtime (e.g. via
/// `#[actix_web::main]`). On shutdown the HTTP server completes first,
/// then the refresh loop is stopped so an in-flight tick finishes
/// cleanly.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    let store: Arc<dyn ReportStore> = Arc::new(MemoryStore::new());
    let metrics = Arc::new(MetricsService::new(
        Arc::clone(&store),
        SnapshotCache::new(config.cache_ttl_ms),
        config.refresh_secs,
    ));
    let analytics = Arc::new(AnalyticsService::new(Arc::clone(&store)));
    let publisher = Arc::new(BroadcastPublisher::new());

    let mut refresh = RefreshLoop::new(
        Arc::clone(&metrics),
        Arc::clone(&publisher) as Arc<dyn Publisher>,
        Duration::from_secs(config.refresh_secs),
    );
    if config.refresh_enabled {
        refresh.start();
    } else {
        log::info!("Background metrics refresh disabled");
    }

    let state = web::Data::new(AppState {
        store,
        metrics,
        analytics,
        publisher,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    refresh.stop().await;
    Ok(())
}
