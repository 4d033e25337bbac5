//! Cargolink HTTP Server
//!
//! Main entry point for the HTTP API server.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use application::{TripService, VehicleAssigner};
use axum::http::{HeaderValue, Method, header};
use infrastructure::{
    AppConfig, SecurityValidator, SqliteDatabaseHealth, SqliteTripStore, SqliteVehicleRegistry,
    build_geocode_resolver, build_route_resolver, create_pool, init_logging,
};
use presentation_http::{AppState, create_router, set_expose_internal_errors};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(config.server.log_format)?;

    info!("Cargolink v{} starting...", env!("CARGO_PKG_VERSION"));

    config.validate().context("Invalid configuration")?;

    let warnings = SecurityValidator::validate(&config);
    SecurityValidator::log_warnings(&warnings);
    if SecurityValidator::should_block_startup(&config, &warnings) {
        anyhow::bail!(
            "Refusing to start with critical security warnings in production \
             (set CARGOLINK_ALLOW_INSECURE_CONFIG=true to override)"
        );
    }
    set_expose_internal_errors(!config.is_production());

    info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.path,
        "Configuration loaded"
    );

    // Persistence
    let pool = Arc::new(create_pool(&config.database).context("Failed to open database")?);
    let trip_store = Arc::new(SqliteTripStore::new(Arc::clone(&pool)));
    let vehicle_registry = Arc::new(SqliteVehicleRegistry::new(Arc::clone(&pool)));
    let database_health = Arc::new(SqliteDatabaseHealth::new(Arc::clone(&pool)));

    // Providers
    let route_resolver = Arc::new(
        build_route_resolver(&config.routing).context("Failed to build route providers")?,
    );
    let geocoder = Arc::new(
        build_geocode_resolver(&config.geocoding).context("Failed to build geocoder")?,
    );

    // Services
    let trip_service = TripService::new(
        trip_store,
        Arc::clone(&route_resolver),
        Arc::new(VehicleAssigner::new(vehicle_registry)),
    );

    let state = AppState {
        trip_service: Arc::new(trip_service),
        route_resolver,
        geocoder,
        database_health: Some(database_health),
        config: Arc::new(config.clone()),
    };

    // Add middleware (order matters: last added = outermost)
    let mut app = create_router(state)
        .layer(RequestBodyLimitLayer::new(
            config.server.max_body_size_json_bytes,
        ))
        .layer(TraceLayer::new_for_http());
    if config.server.cors_enabled {
        app = app.layer(cors_layer(&config.server.allowed_origins));
    }

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server listening on http://{}", addr);
    info!("API docs: http://{}/swagger-ui", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Allow every origin when none are configured, otherwise only the listed ones
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Wait for shutdown signals (SIGINT, SIGTERM) and handle graceful shutdown
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    info!("Waiting up to {:?} for connections to close...", timeout);
}
