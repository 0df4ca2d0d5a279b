//! The only metric this service owns: how many dashboard queries it served,
//! by endpoint. Richer metrics exposition belongs to the excluded outer
//! layer (spec.md §1).

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref QUERIES_SERVED: IntCounterVec = IntCounterVec::new(
        prometheus::opts!("query_surface_queries_served_total", "analytics dashboard queries served, by endpoint"),
        &["endpoint"]
    )
    .unwrap();
}

pub fn register() {
    let _ = REGISTRY.register(Box::new(QUERIES_SERVED.clone()));
}
