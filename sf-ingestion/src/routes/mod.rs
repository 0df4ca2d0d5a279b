pub mod submit;
pub mod ws;

pub use submit::{submit_batch, submit_event};
pub use ws::ws_handler;
