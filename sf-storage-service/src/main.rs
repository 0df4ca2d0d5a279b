use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sf_fabric::topology::QUEUE_STORAGE_EVENTS;
use sf_fabric::{connect_transport, declare_standard_topology, ConsumeHandler, Fabric};
use sf_storage_service::config::Config;
use sf_storage_service::{health, metrics, metrics_handler, ready, retention_worker, routes, AppState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    metrics::register();

    let config = Config::from_env().expect("failed to load storage service configuration");
    tracing::info!(host = %config.host, port = config.port, bus_type = %config.bus_type, "starting storage service");

    let pool = sf_store::db::init_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    sf_store::db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let transport = connect_transport(&config.bus_type, &config.nats_url)
        .await
        .expect("failed to connect to message fabric transport");
    let fabric = Fabric::new(transport);
    declare_standard_topology(&fabric)
        .await
        .expect("failed to declare broker topology");

    {
        let pool = pool.clone();
        let handler: ConsumeHandler = Arc::new(move |envelope, _subject| {
            let pool = pool.clone();
            Box::pin(async move { sf_storage_service::consumer::handle_event(&pool, envelope).await })
        });
        fabric
            .consume_with_prefetch(QUEUE_STORAGE_EVENTS, handler, false, config.prefetch)
            .await
            .expect("failed to start storage.events consumer");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(retention_worker::run(
        pool.clone(),
        config.retention_sweep_interval_secs,
        shutdown_rx,
    ));

    let state = AppState { pool: pool.clone() };

    let app = Router::new()
        .route("/events/{id}", get(routes::get_event))
        .route("/api/v1/events/query", post(routes::query_events))
        .route("/api/v1/stats", get(routes::stats))
        .route("/api/v1/backup", post(routes::backup))
        .route("/api/v1/cleanup", post(routes::cleanup))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, "storage service listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
