pub mod backup;
pub mod events;

pub use backup::{backup, cleanup};
pub use events::{get_event, query_events, stats};
