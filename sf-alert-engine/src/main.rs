use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sf_alert_engine::config::Config;
use sf_alert_engine::consumer::{default_channels, make_default_registry, AlertEngine};
use sf_alert_engine::{health, lifecycle, metrics, metrics_handler, ready, routes, AppState};
use sf_fabric::topology::{QUEUE_ALERTING_ANALYTICS, QUEUE_ALERTING_DIRECT};
use sf_fabric::{connect_transport, declare_standard_topology, Fabric};
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

    let config = Config::from_env().expect("failed to load alert engine configuration");
    tracing::info!(host = %config.host, port = config.port, bus_type = %config.bus_type, "starting alert engine");

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

    let engine = Arc::new(AlertEngine {
        pool: pool.clone(),
        registry: make_default_registry(),
        channels: default_channels(&config),
    });

    {
        let engine = engine.clone();
        let handler: sf_fabric::ConsumeHandler = Arc::new(move |envelope, _subject| {
            let engine = engine.clone();
            Box::pin(async move { engine.handle_analytics(envelope).await })
        });
        fabric
            .consume_with_prefetch(QUEUE_ALERTING_ANALYTICS, handler, false, config.prefetch)
            .await
            .expect("failed to start alerting.analytics consumer");
    }
    {
        let engine = engine.clone();
        let handler: sf_fabric::ConsumeHandler = Arc::new(move |envelope, _subject| {
            let engine = engine.clone();
            Box::pin(async move { engine.handle_direct(envelope).await })
        });
        fabric
            .consume_with_prefetch(QUEUE_ALERTING_DIRECT, handler, false, config.prefetch)
            .await
            .expect("failed to start alerting.direct consumer");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(lifecycle::run(engine.clone(), shutdown_rx));

    let state = AppState { pool: pool.clone() };

    let app = Router::new()
        .route("/api/v1/alerts", get(routes::list_alerts))
        .route("/api/v1/alerts/stats", get(routes::alert_stats))
        .route("/api/v1/alerts/{id}/acknowledge", post(routes::acknowledge_alert))
        .route("/api/v1/alerts/{id}/resolve", post(routes::resolve_alert))
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
    tracing::info!(%addr, "alert engine listening");

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
