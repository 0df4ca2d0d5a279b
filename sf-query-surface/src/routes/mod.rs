pub mod analytics;

pub use analytics::{get_event_trends, get_event_types, get_top_sources, get_user_distribution};
