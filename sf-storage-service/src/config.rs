use std::env;

/// Storage service configuration, parsed from the environment the way
/// `gl::config::Config::from_env` does: required vars fail fast into a
/// `Fatal` startup error, optional vars fall back to a documented
/// default.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bus_type: String,
    pub nats_url: String,
    pub host: String,
    pub port: u16,
    pub prefetch: usize,
    /// Cadence of the retention sweep, per spec.md §4.F "hourly cadence".
    pub retention_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
        let bus_type = env::var("BUS_TYPE").unwrap_or_else(|_| "inmemory".to_string());
        let nats_url =
            env::var("BROKER_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8084".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;
        let prefetch = env::var("PREFETCH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);
        let retention_sweep_interval_secs = env::var("RETENTION_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Ok(Self {
            database_url,
            bus_type,
            nats_url,
            host,
            port,
            prefetch,
            retention_sweep_interval_secs,
        })
    }
}
