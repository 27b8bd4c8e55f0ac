pub mod credential_store;
pub mod documentation;
pub mod orchestration;
pub mod project_store;
pub mod stage_generator;

pub use credential_store::{mask_credential, CredentialStore, CREDENTIAL_KEY};
pub use documentation::{DocumentationService, MarkdownExport};
pub use orchestration::{OrchestrationReport, OrchestrationService, StatusBoard};
pub use project_store::{project_key, ProjectStore, PROJECT_KEY_PREFIX};
pub use stage_generator::StageGenerator;
