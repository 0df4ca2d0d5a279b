use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use sf_fabric::topology::QUEUE_ANALYTICS_EVENTS;
use sf_fabric::{connect_transport, declare_standard_topology, Fabric};
use sf_stream_processor::config::Config;
use sf_stream_processor::processor::Processor;
use sf_stream_processor::rules::RuleRegistry;
use sf_stream_processor::windows::WindowRegistry;
use sf_stream_processor::{health, metrics, metrics_handler, ready};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    metrics::register();

    let config = Config::from_env().expect("failed to load stream processor configuration");
    tracing::info!(host = %config.host, port = config.port, bus_type = %config.bus_type, "starting stream processor");

    let transport = connect_transport(&config.bus_type, &config.nats_url)
        .await
        .expect("failed to connect to message fabric transport");
    let fabric = Fabric::new(transport);
    declare_standard_topology(&fabric)
        .await
        .expect("failed to declare broker topology");

    let windows = WindowRegistry::new(sf_domain::WindowSpec::defaults());
    let rules = RuleRegistry::new();
    for rule in sf_stream_processor::rules::default_rules() {
        rules
            .register(rule)
            .expect("built-in rule failed to register");
    }
    let processor = Arc::new(Processor::new(windows, rules, fabric.clone()));

    {
        let processor = processor.clone();
        let handler: sf_fabric::ConsumeHandler = Arc::new(move |envelope, _subject| {
            let processor = processor.clone();
            Box::pin(async move {
                let event: sf_domain::Event = serde_json::from_value(envelope.payload)
                    .map_err(|e| format!("malformed event payload: {e}"))?;
                processor.process(event).await;
                Ok(())
            })
        });
        fabric
            .consume_with_prefetch(QUEUE_ANALYTICS_EVENTS, handler, false, config.prefetch)
            .await
            .expect("failed to start analytics.events consumer");
    }

    let app = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, "stream processor listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
