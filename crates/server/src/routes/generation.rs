use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use planwise_core::{OrchestrationStatus, ProjectData};

use crate::error::AppError;
use crate::state::AppState;

/// Start the full generation sequence in the background. The returned
/// handle is dropped; progress is observable through the status board and
/// the event stream.
pub(crate) async fn spawn_generation(
    state: &AppState,
    project: ProjectData,
    credential: String,
) -> Result<(), AppError> {
    let project_id = project.id.clone();
    state
        .orchestration
        .start(&state.runs, project, credential)
        .await?;

    tracing::info!(project_id = %project_id, "Generation started in background");
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/generate",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 202, description = "Generation started"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Generation already running"),
        (status = 412, description = "No API key stored")
    ),
    tag = "generation"
)]
pub async fn start_generation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let credential = state.credentials.require().await?;
    let project = state.projects.get(&id).await?;

    spawn_generation(&state, project, credential).await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/generation",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Latest generation status", body = OrchestrationStatus),
        (status = 404, description = "Project not found")
    ),
    tag = "generation"
)]
pub async fn get_generation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrchestrationStatus>, AppError> {
    if state.projects.load(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project not found: {}", id)));
    }
    Ok(Json(state.orchestration.status(&id).await))
}
