use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use orchestrator::mask_credential;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub configured: bool,
    /// First and last characters only, never the full key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<String>,
}

impl CredentialStatus {
    fn from_key(key: Option<String>) -> Self {
        Self {
            configured: key.is_some(),
            masked: key.as_deref().map(mask_credential),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCredentialRequest {
    pub api_key: String,
}

#[utoipa::path(
    get,
    path = "/api/credential",
    responses(
        (status = 200, description = "Whether an API key is stored", body = CredentialStatus)
    ),
    tag = "credential"
)]
pub async fn get_credential(
    State(state): State<AppState>,
) -> Result<Json<CredentialStatus>, AppError> {
    let key = state.credentials.get().await?;
    Ok(Json(CredentialStatus::from_key(key)))
}

#[utoipa::path(
    put,
    path = "/api/credential",
    request_body = SetCredentialRequest,
    responses(
        (status = 200, description = "API key saved", body = CredentialStatus),
        (status = 400, description = "Empty API key")
    ),
    tag = "credential"
)]
pub async fn set_credential(
    State(state): State<AppState>,
    Json(payload): Json<SetCredentialRequest>,
) -> Result<Json<CredentialStatus>, AppError> {
    state.credentials.set(&payload.api_key).await?;
    let key = state.credentials.get().await?;
    Ok(Json(CredentialStatus::from_key(key)))
}

#[utoipa::path(
    delete,
    path = "/api/credential",
    responses(
        (status = 204, description = "API key cleared")
    ),
    tag = "credential"
)]
pub async fn clear_credential(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.credentials.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
