use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bus_type: String,
    pub nats_url: String,
    pub host: String,
    pub port: u16,
    pub prefetch: usize,
    pub email_from: String,
    pub slack_webhook_url: Option<String>,
    pub webhook_url: Option<String>,
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
            .unwrap_or_else(|_| "8083".to_string())
            .parse()
            .map_err(|_| "PORT must be a valid u16".to_string())?;
        let prefetch = env::var("PREFETCH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);
        let email_from = env::var("ALERT_EMAIL_FROM").unwrap_or_else(|_| "alerts@streamflow.local".to_string());
        let slack_webhook_url = env::var("SLACK_WEBHOOK_URL").ok();
        let webhook_url = env::var("ALERT_WEBHOOK_URL").ok();

        Ok(Self {
            database_url,
            bus_type,
            nats_url,
            host,
            port,
            prefetch,
            email_from,
            slack_webhook_url,
            webhook_url,
        })
    }
}
