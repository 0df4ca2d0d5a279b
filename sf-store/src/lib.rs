//! Persistence layer shared by every service that touches the store:
//! events + alerts schema, the query/stats/retention/backup contracts,
//! and the generic transactional outbox.
//!
//! Generalizes the teacher's `gl::repos` (plain runtime-checked queries,
//! `FromRow` result structs, per-repo `thiserror` enums) across the two
//! tables the pipeline needs instead of the teacher's dozen ledger tables.

pub mod alerts_repo;
pub mod backup;
pub mod db;
pub mod error;
pub mod events_repo;
pub mod outbox;
pub mod processed_repo;
pub mod retention;

pub use error::StoreError;
