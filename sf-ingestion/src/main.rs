use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sf_fabric::{connect_transport, declare_standard_topology, Fabric};
use sf_ingestion::{config::Config, ready, routes, health, outbox_publisher, AppState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    sf_ingestion::metrics::register();

    let config = Config::from_env().expect("failed to load ingestion configuration");
    tracing::info!(host = %config.host, port = config.port, bus_type = %config.bus_type, "starting ingestion edge");

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

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(outbox_publisher::run(pool.clone(), fabric.clone(), shutdown_rx));

    let state = AppState { pool: pool.clone() };

    let app = Router::new()
        .route("/events", post(routes::submit_event))
        .route("/events/batch", post(routes::submit_batch))
        .route("/ws", get(routes::ws_handler))
        .route("/health", get(health))
        .route("/ready", get(ready))
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
    tracing::info!(%addr, "ingestion edge listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining outbox");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
