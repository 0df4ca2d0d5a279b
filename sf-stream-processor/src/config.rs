use std::env;

/// Stream processor configuration. No database: this service is
/// stateless, holding only in-memory windows and the rule registry.
#[derive(Debug, Clone)]
pub struct Config {
    pub bus_type: String,
    pub nats_url: String,
    pub host: String,
    pub port: u16,
    /// Prefetch bound on the `analytics.events` consumer.
    pub prefetch: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let bus_type = env::var("BUS_TYPE").unwrap_or_else(|_| "inmemory".to_string());
        let nats_url =
            env::var("BROKER_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8082".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;
        let prefetch = env::var("PREFETCH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(32);

        Ok(Self {
            bus_type,
            nats_url,
            host,
            port,
            prefetch,
        })
    }
}
