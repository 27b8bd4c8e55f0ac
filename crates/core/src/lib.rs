//! Domain model for planwise: the project record produced by the planning
//! questionnaire, the AI-generated planning results, and the fixed seven-stage
//! roadmap those results unlock.

pub mod domain;
pub mod error;

pub use domain::documentation::*;
pub use domain::generation::*;
pub use domain::project::*;
pub use domain::stage::*;
pub use error::CoreError;
