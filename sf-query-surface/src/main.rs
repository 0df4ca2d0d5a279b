use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use sf_query_surface::config::Config;
use sf_query_surface::{health, metrics, metrics_handler, ready, routes, AppState};
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

    let config = Config::from_env().expect("failed to load query surface configuration");
    tracing::info!(host = %config.host, port = config.port, "starting query surface");

    let pool = sf_store::db::init_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    sf_store::db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let state = AppState { pool };

    let app = Router::new()
        .route("/api/v1/analytics/event-trends", get(routes::get_event_trends))
        .route("/api/v1/analytics/user-distribution", get(routes::get_user_distribution))
        .route("/api/v1/analytics/top-sources", get(routes::get_top_sources))
        .route("/api/v1/analytics/event-types", get(routes::get_event_types))
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
    tracing::info!(%addr, "query surface listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
