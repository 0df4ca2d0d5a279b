pub mod alerts;

pub use alerts::{acknowledge_alert, alert_stats, list_alerts, resolve_alert};
