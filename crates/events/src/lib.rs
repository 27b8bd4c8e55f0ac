//! Event system for planwise
//!
//! Broadcasts project and generation progress events to SSE subscribers.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
