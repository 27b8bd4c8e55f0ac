use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use events::Event;
use orchestrator::DocumentationService;
use planwise_core::{ProjectData, ProjectUpdate};

use crate::error::AppError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/projects/{id}/documentation",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Documentation generated and saved", body = ProjectData),
        (status = 404, description = "Project not found"),
        (status = 412, description = "No API key stored"),
        (status = 502, description = "AI service returned an unusable response")
    ),
    tag = "documentation"
)]
pub async fn generate_documentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectData>, AppError> {
    let credential = state.credentials.require().await?;
    let project = state.projects.get(&id).await?;

    let docs = state.documentation.generate(&project, &credential).await?;
    let project = state
        .projects
        .update(
            &id,
            ProjectUpdate {
                documentation: Some(docs),
                ..Default::default()
            },
        )
        .await?;

    state.emit(Event::ProjectUpdated { project_id: id });
    Ok(Json(project))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/documentation/markdown",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Documentation as a Markdown download", content_type = "text/markdown"),
        (status = 404, description = "Project or documentation not found")
    ),
    tag = "documentation"
)]
pub async fn download_markdown(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = state.projects.get(&id).await?;
    let export = DocumentationService::markdown(&project).ok_or_else(|| {
        AppError::NotFound(format!("No documentation generated for project {}", id))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.content,
    ))
}
