use genai::GenAiError;
use planwise_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("No API key configured")]
    MissingCredential,

    #[error("Generation already running for project {0}")]
    AlreadyRunning(String),

    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("AI error: {0}")]
    GenAi(#[from] GenAiError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl OrchestratorError {
    /// Message fit for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::GenAi(e) => e.user_message(),
            Self::MissingCredential => {
                "Add your API key in settings to generate content.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
