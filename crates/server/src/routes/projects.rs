use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use events::Event;
use planwise_core::{ProjectData, ProjectSummary, ProjectUpdate, Questionnaire};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::routes::spawn_generation;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub project: ProjectData,
    /// False when no API key is stored; stages are then filled manually
    pub generation_started: bool,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Saved projects, most recent first", body = Vec<ProjectSummary>)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSummary>>, AppError> {
    Ok(Json(state.projects.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = Questionnaire,
    responses(
        (status = 201, description = "Project created", body = CreateProjectResponse),
        (status = 400, description = "Platform or project type missing")
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    Json(answers): Json<Questionnaire>,
) -> Result<(StatusCode, Json<CreateProjectResponse>), AppError> {
    let project = state.projects.create(answers).await?;
    state.emit(Event::ProjectCreated {
        project_id: project.id.clone(),
    });

    let generation_started = match state.credentials.get().await? {
        Some(credential) => {
            spawn_generation(&state, project.clone(), credential).await?;
            true
        }
        None => {
            tracing::info!(project_id = %project.id, "No API key stored, skipping generation");
            false
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            project,
            generation_started,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = ProjectData),
        (status = 404, description = "Project not found")
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectData>, AppError> {
    Ok(Json(state.projects.get(&id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    request_body = ProjectUpdate,
    responses(
        (status = 200, description = "Update merged into the project", body = ProjectData),
        (status = 404, description = "Project not found")
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<ProjectData>, AppError> {
    if update.is_empty() {
        return Ok(Json(state.projects.get(&id).await?));
    }

    let project = state.projects.update(&id, update).await?;
    state.emit(Event::ProjectUpdated {
        project_id: project.id.clone(),
    });
    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Generation is running for this project")
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.runs.is_running(&id) {
        return Err(AppError::Conflict(format!(
            "Generation is running for project {}, wait for it to finish before deleting",
            id
        )));
    }

    if !state.projects.delete(&id).await? {
        return Err(AppError::NotFound(format!("Project not found: {}", id)));
    }

    state.statuses.remove(&id).await;
    state.emit(Event::ProjectDeleted { project_id: id });
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/export",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project as a downloadable JSON file", content_type = "application/json"),
        (status = 404, description = "Project not found")
    ),
    tag = "projects"
)]
pub async fn export_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = state.projects.get(&id).await?;
    let json = serde_json::to_string_pretty(&project)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", project.export_file_name()),
            ),
        ],
        json,
    ))
}

#[utoipa::path(
    post,
    path = "/api/projects/import",
    request_body(content = String, description = "Previously exported project JSON", content_type = "application/json"),
    responses(
        (status = 201, description = "Imported as a new project", body = ProjectData),
        (status = 400, description = "Not a project export")
    ),
    tag = "projects"
)]
pub async fn import_project(
    State(state): State<AppState>,
    body: String,
) -> Result<(StatusCode, Json<ProjectData>), AppError> {
    let project = state.projects.import_json(&body).await?;
    state.emit(Event::ProjectCreated {
        project_id: project.id.clone(),
    });
    Ok((StatusCode::CREATED, Json(project)))
}
