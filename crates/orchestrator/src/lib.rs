pub mod error;
pub mod prompts;
pub mod resources;
pub mod schemas;
pub mod services;
pub mod stage_progression;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{OrchestratorError, Result};
pub use resources::{RunGuard, RunRegistry};
pub use services::*;
pub use stage_progression::StageProgression;
