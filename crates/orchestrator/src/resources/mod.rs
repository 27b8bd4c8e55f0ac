//! RAII resource guards for automatic cleanup.
//!
//! - [`RunGuard`] - Releases a project's orchestration slot, reporting a
//!   failed run if dropped early

mod run_guard;

pub use run_guard::{RunGuard, RunRegistry};
