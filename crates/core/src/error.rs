use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Stage {0} is locked")]
    StageLocked(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
