use axum::extract::{Path, State};
use axum::Json;
use events::Event;
use orchestrator::StageProgression;
use planwise_core::{CoreError, ProjectData, StageId, StageView};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapResponse {
    pub stages: Vec<StageView>,
    /// First stage that is unlocked but not completed
    pub next_stage: Option<StageId>,
    pub progress: u8,
}

impl RoadmapResponse {
    pub fn for_project(project: &ProjectData) -> Self {
        Self {
            stages: StageProgression::roadmap(project),
            next_stage: StageProgression::next_stage(project),
            progress: StageProgression::progress_percent(project),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideFeaturesRequest {
    pub feature_ids: Vec<String>,
}

fn parse_stage(stage: &str) -> Result<StageId, AppError> {
    StageId::parse(stage).ok_or_else(|| CoreError::UnknownStage(stage.to_string()).into())
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/roadmap",
    params(("id" = String, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Stages with their computed status", body = RoadmapResponse),
        (status = 404, description = "Project not found")
    ),
    tag = "stages"
)]
pub async fn get_roadmap(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoadmapResponse>, AppError> {
    let project = state.projects.get(&id).await?;
    Ok(Json(RoadmapResponse::for_project(&project)))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/stages/{stage}/complete",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("stage" = String, Path, description = "Stage ID, e.g. ui-design")
    ),
    responses(
        (status = 200, description = "Stage marked completed", body = RoadmapResponse),
        (status = 400, description = "Unknown stage"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Stage is still locked")
    ),
    tag = "stages"
)]
pub async fn complete_stage(
    State(state): State<AppState>,
    Path((id, stage)): Path<(String, String)>,
) -> Result<Json<RoadmapResponse>, AppError> {
    let stage = parse_stage(&stage)?;
    let mut project = state.projects.get(&id).await?;

    StageProgression::mark_completed(stage, &mut project)?;
    state.projects.save(&project).await?;

    tracing::info!(project_id = %id, stage = %stage, "Stage marked completed");
    state.emit(Event::StageMarkedCompleted {
        project_id: id,
        stage: stage.as_str().to_string(),
    });

    Ok(Json(RoadmapResponse::for_project(&project)))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/stages/{stage}/generate",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("stage" = String, Path, description = "Stage ID, e.g. ui-design")
    ),
    responses(
        (status = 200, description = "Stage regenerated and saved", body = ProjectData),
        (status = 400, description = "Unknown stage"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Full generation still running"),
        (status = 412, description = "No API key stored"),
        (status = 502, description = "AI service returned an unusable response")
    ),
    tag = "stages"
)]
pub async fn generate_stage(
    State(state): State<AppState>,
    Path((id, stage)): Path<(String, String)>,
) -> Result<Json<ProjectData>, AppError> {
    let stage = parse_stage(&stage)?;
    let credential = state.credentials.require().await?;
    let mut project = state.projects.get(&id).await?;

    if state.runs.is_running(&id) {
        return Err(AppError::Conflict(format!(
            "Generation already running for project {}",
            id
        )));
    }

    let update = state
        .generator
        .generate_stage(stage, &project, &credential)
        .await?;
    project.merge(update);
    state.projects.save(&project).await?;

    tracing::info!(project_id = %id, stage = %stage, "Stage regenerated");
    state.emit(Event::ProjectUpdated { project_id: id });

    Ok(Json(project))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/decided-features",
    params(("id" = String, Path, description = "Project ID")),
    request_body = DecideFeaturesRequest,
    responses(
        (status = 200, description = "Decided features replaced", body = ProjectData),
        (status = 400, description = "Unknown feature id"),
        (status = 404, description = "Project not found")
    ),
    tag = "stages"
)]
pub async fn decide_features(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DecideFeaturesRequest>,
) -> Result<Json<ProjectData>, AppError> {
    let mut project = state.projects.get(&id).await?;
    project.decide_features(&payload.feature_ids)?;
    state.projects.save(&project).await?;

    state.emit(Event::ProjectUpdated { project_id: id });
    Ok(Json(project))
}
