use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use genai::GenAiError;
use orchestrator::OrchestratorError;
use planwise_core::CoreError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
    Database(db::DbError),
    Orchestrator(OrchestratorError),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn genai_status(err: &GenAiError) -> (StatusCode, &'static str) {
    match err {
        GenAiError::RateLimited(_) | GenAiError::Overloaded(_) => {
            (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
        }
        GenAiError::QuotaExceeded(_) => (StatusCode::PAYMENT_REQUIRED, "quota_exceeded"),
        GenAiError::InvalidCredential(_) => (StatusCode::UNAUTHORIZED, "invalid_credential"),
        _ => (StatusCode::BAD_GATEWAY, "upstream_error"),
    }
}

fn core_status(err: &CoreError) -> (StatusCode, &'static str) {
    match err {
        CoreError::ProjectNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CoreError::StageLocked(_) => (StatusCode::CONFLICT, "stage_locked"),
        CoreError::UnknownStage(_) | CoreError::FeatureNotFound(_) | CoreError::Validation(_) => {
            (StatusCode::BAD_REQUEST, "bad_request")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error occurred".to_string(),
                )
            }
            AppError::Orchestrator(err) => match err {
                OrchestratorError::ProjectNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Project not found: {}", id),
                ),
                OrchestratorError::MissingCredential => (
                    StatusCode::PRECONDITION_FAILED,
                    "missing_credential",
                    err.user_message(),
                ),
                OrchestratorError::AlreadyRunning(_) => {
                    (StatusCode::CONFLICT, "already_running", err.to_string())
                }
                OrchestratorError::InvalidImport(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_import", msg)
                }
                OrchestratorError::Core(ref core) => {
                    let (status, error_type) = core_status(core);
                    (status, error_type, core.to_string())
                }
                OrchestratorError::GenAi(ref genai) => {
                    tracing::warn!("AI request failed: {}", genai);
                    let (status, error_type) = genai_status(genai);
                    (status, error_type, genai.user_message())
                }
                OrchestratorError::Database(err) => {
                    tracing::error!("Database error: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "Database error occurred".to_string(),
                    )
                }
                OrchestratorError::Serialization(msg) => {
                    tracing::error!("Serialization error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<db::DbError> for AppError {
    fn from(err: db::DbError) -> Self {
        AppError::Database(err)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        AppError::Orchestrator(err)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Orchestrator(OrchestratorError::Core(err))
    }
}

impl From<GenAiError> for AppError {
    fn from(err: GenAiError) -> Self {
        AppError::Orchestrator(OrchestratorError::GenAi(err))
    }
}
