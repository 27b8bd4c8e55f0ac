pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Planwise API",
        version = "0.1.0",
        description = "Questionnaire-driven project planning with AI-generated roadmap stages"
    ),
    paths(
        routes::health_check,
        routes::get_credential,
        routes::set_credential,
        routes::clear_credential,
        routes::list_projects,
        routes::create_project,
        routes::get_project,
        routes::update_project,
        routes::delete_project,
        routes::export_project,
        routes::import_project,
        routes::get_roadmap,
        routes::complete_stage,
        routes::generate_stage,
        routes::decide_features,
        routes::start_generation,
        routes::get_generation_status,
        routes::generate_documentation,
        routes::download_markdown,
        routes::sse::events_stream,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::CredentialStatus,
        routes::SetCredentialRequest,
        routes::CreateProjectResponse,
        routes::RoadmapResponse,
        routes::DecideFeaturesRequest,
        error::ErrorResponse,
        orchestrator::OrchestrationReport,
        planwise_core::Questionnaire,
        planwise_core::ProjectData,
        planwise_core::ProjectUpdate,
        planwise_core::ProjectSummary,
        planwise_core::Feature,
        planwise_core::FeaturePriority,
        planwise_core::FlowNode,
        planwise_core::FlowNodeType,
        planwise_core::Position,
        planwise_core::TechStack,
        planwise_core::UiStyle,
        planwise_core::ColorPalette,
        planwise_core::Typography,
        planwise_core::BuilderTool,
        planwise_core::DeploymentOption,
        planwise_core::DeploymentPlan,
        planwise_core::ProjectDocumentation,
        planwise_core::DocumentedFeature,
        planwise_core::StageId,
        planwise_core::StageStatus,
        planwise_core::StageView,
        planwise_core::RoadmapStage,
        planwise_core::GenerationStep,
        planwise_core::OrchestrationPhase,
        planwise_core::OrchestrationStatus,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "credential", description = "AI service key management"),
        (name = "projects", description = "Project CRUD, export and import"),
        (name = "stages", description = "Roadmap stages and per-stage regeneration"),
        (name = "generation", description = "Full generation sequence"),
        (name = "documentation", description = "Project documentation and Markdown download"),
        (name = "events", description = "Real-time event streaming (SSE)"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route(
            "/api/credential",
            get(routes::get_credential)
                .put(routes::set_credential)
                .delete(routes::clear_credential),
        )
        .route(
            "/api/projects",
            get(routes::list_projects).post(routes::create_project),
        )
        .route("/api/projects/import", post(routes::import_project))
        .route(
            "/api/projects/{id}",
            get(routes::get_project)
                .patch(routes::update_project)
                .delete(routes::delete_project),
        )
        .route("/api/projects/{id}/export", get(routes::export_project))
        .route("/api/projects/{id}/roadmap", get(routes::get_roadmap))
        .route(
            "/api/projects/{id}/stages/{stage}/complete",
            post(routes::complete_stage),
        )
        .route(
            "/api/projects/{id}/stages/{stage}/generate",
            post(routes::generate_stage),
        )
        .route(
            "/api/projects/{id}/decided-features",
            put(routes::decide_features),
        )
        .route("/api/projects/{id}/generate", post(routes::start_generation))
        .route(
            "/api/projects/{id}/generation",
            get(routes::get_generation_status),
        )
        .route(
            "/api/projects/{id}/documentation",
            post(routes::generate_documentation),
        )
        .route(
            "/api/projects/{id}/documentation/markdown",
            get(routes::download_markdown),
        )
        .route("/api/events", get(routes::sse::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
