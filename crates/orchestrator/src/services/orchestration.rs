//! Orchestration Service
//!
//! Runs every generation step in a fixed order right after the questionnaire,
//! feeding each step the project state accumulated so far:
//! naming → logo → tech stack → features → UI design → UI flow →
//! builder tools → deployment.
//!
//! A failed logo is skipped. Any other failure stops the run, keeps what the
//! earlier steps produced and leaves the remaining stages for manual
//! regeneration.

use std::collections::HashMap;
use std::sync::Arc;

use events::{Event, EventBus};
use planwise_core::{GenerationStep, OrchestrationStatus, ProjectData};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::error::OrchestratorError;
use crate::resources::RunRegistry;
use crate::services::project_store::ProjectStore;
use crate::services::stage_generator::StageGenerator;

/// Latest orchestration status per project id
#[derive(Clone, Default)]
pub struct StatusBoard {
    statuses: Arc<RwLock<HashMap<String, OrchestrationStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status for `project_id`; idle when no run has been recorded
    pub async fn get(&self, project_id: &str) -> OrchestrationStatus {
        self.statuses
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_else(OrchestrationStatus::idle)
    }

    pub async fn set(&self, project_id: &str, status: OrchestrationStatus) {
        self.statuses
            .write()
            .await
            .insert(project_id.to_string(), status);
    }

    pub async fn remove(&self, project_id: &str) {
        self.statuses.write().await.remove(project_id);
    }
}

/// Outcome of one orchestration run
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationReport {
    pub project: ProjectData,
    pub completed_steps: Vec<GenerationStep>,
    /// Steps that failed without stopping the run
    pub skipped_steps: Vec<GenerationStep>,
    pub failed_step: Option<GenerationStep>,
    pub error: Option<String>,
}

impl OrchestrationReport {
    fn new(project: ProjectData) -> Self {
        Self {
            project,
            completed_steps: Vec::new(),
            skipped_steps: Vec::new(),
            failed_step: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}

#[derive(Clone)]
pub struct OrchestrationService {
    generator: StageGenerator,
    projects: ProjectStore,
    statuses: StatusBoard,
    event_bus: Option<EventBus>,
}

impl OrchestrationService {
    pub fn new(generator: StageGenerator, projects: ProjectStore, statuses: StatusBoard) -> Self {
        Self {
            generator,
            projects,
            statuses,
            event_bus: None,
        }
    }

    /// Set event bus for progress notifications via SSE
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub async fn status(&self, project_id: &str) -> OrchestrationStatus {
        self.statuses.get(project_id).await
    }

    fn emit(&self, event: Event) {
        if let Some(ref bus) = self.event_bus {
            bus.emit(event);
        }
    }

    /// Update the status and emit a progress event
    async fn set_status_with_event(&self, project_id: &str, status: OrchestrationStatus) {
        debug!(
            project_id = %project_id,
            phase = status.phase.as_str(),
            progress = status.progress,
            "Status update"
        );

        if let Some(step) = status.step.filter(|_| status.phase.is_active()) {
            self.emit(Event::GenerationProgress {
                project_id: project_id.to_string(),
                step: step.as_str().to_string(),
                progress: status.progress,
                message: status.message.clone(),
            });
        }
        self.statuses.set(project_id, status).await;
    }

    /// Run all steps for `project`. Step failures end up in the report, not
    /// in an `Err`; the project is saved after every successful step.
    ///
    /// Each step reloads the stored project before generating and again
    /// before merging, so edits made while the run is in flight survive and a
    /// deleted project ends the run without being written back.
    pub async fn run(&self, project: ProjectData, credential: &str) -> OrchestrationReport {
        let project_id = project.id.clone();
        let mut report = OrchestrationReport::new(project);
        let mut logo_idea: Option<String> = None;
        let mut progress = 0u8;

        info!(project_id = %project_id, "Starting orchestration");
        self.emit(Event::GenerationStarted {
            project_id: project_id.clone(),
        });

        for step in GenerationStep::SEQUENCE {
            match self.reload(&project_id).await {
                Ok(Some(current)) => report.project = current,
                Ok(None) => return self.abandon(report, step).await,
                Err(message) => return self.stop(report, step, progress, message).await,
            }

            self.set_status_with_event(&project_id, OrchestrationStatus::running(step, progress))
                .await;

            let result = match step {
                GenerationStep::Naming => {
                    match self.generator.naming(&report.project, credential).await {
                        Ok(naming) => {
                            logo_idea = naming.logo_idea();
                            Ok(naming.into_update())
                        }
                        Err(e) => Err(e),
                    }
                }
                GenerationStep::Logo => {
                    self.generator
                        .logo(&report.project, logo_idea.as_deref(), credential)
                        .await
                }
                _ => {
                    self.generator
                        .generate_step(step, &report.project, credential)
                        .await
                }
            };

            let update = match result {
                Ok(update) => update,
                Err(e) if step == GenerationStep::Logo => {
                    warn!(
                        project_id = %project_id,
                        error = %e,
                        "Logo generation failed, continuing without a logo"
                    );
                    progress = step.progress_after();
                    report.skipped_steps.push(step);
                    self.emit(Event::StepFailed {
                        project_id: project_id.clone(),
                        step: step.as_str().to_string(),
                        error: e.user_message(),
                        skipped: true,
                    });
                    continue;
                }
                Err(e) => {
                    warn!(project_id = %project_id, step = %step, error = %e, "Generation step failed");
                    return self.stop(report, step, progress, e.user_message()).await;
                }
            };

            match self.reload(&project_id).await {
                Ok(Some(current)) => report.project = current,
                Ok(None) => return self.abandon(report, step).await,
                Err(message) => return self.stop(report, step, progress, message).await,
            }
            report.project.merge(update);
            if let Err(e) = self.projects.save(&report.project).await {
                return self.stop(report, step, progress, e.user_message()).await;
            }

            progress = step.progress_after();
            report.completed_steps.push(step);
            self.emit(Event::StepCompleted {
                project_id: project_id.clone(),
                step: step.as_str().to_string(),
            });
        }

        self.set_status_with_event(&project_id, OrchestrationStatus::completed())
            .await;
        self.emit(Event::GenerationFinished {
            project_id: project_id.clone(),
            with_errors: false,
        });

        info!(
            project_id = %project_id,
            completed = report.completed_steps.len(),
            skipped = report.skipped_steps.len(),
            "Orchestration complete"
        );
        report
    }

    async fn reload(&self, project_id: &str) -> Result<Option<ProjectData>, String> {
        self.projects
            .load(project_id)
            .await
            .map_err(|e| e.user_message())
    }

    /// End the run at `step`, keeping what earlier steps stored
    async fn stop(
        &self,
        mut report: OrchestrationReport,
        step: GenerationStep,
        progress: u8,
        message: String,
    ) -> OrchestrationReport {
        let project_id = report.project.id.clone();
        error!(project_id = %project_id, step = %step, error = %message, "Orchestration stopped");
        self.emit(Event::StepFailed {
            project_id: project_id.clone(),
            step: step.as_str().to_string(),
            error: message.clone(),
            skipped: false,
        });
        self.set_status_with_event(
            &project_id,
            OrchestrationStatus::completed_with_errors(step, progress, message.clone()),
        )
        .await;
        self.emit(Event::GenerationFinished {
            project_id,
            with_errors: true,
        });

        report.failed_step = Some(step);
        report.error = Some(message);
        report
    }

    /// The project was deleted under the run; nothing is written back
    async fn abandon(
        &self,
        mut report: OrchestrationReport,
        step: GenerationStep,
    ) -> OrchestrationReport {
        let project_id = report.project.id.clone();
        info!(project_id = %project_id, step = %step, "Project deleted, abandoning orchestration");
        self.statuses.remove(&project_id).await;
        self.emit(Event::GenerationFinished {
            project_id,
            with_errors: true,
        });

        report.failed_step = Some(step);
        report.error = Some("The project was deleted during generation.".to_string());
        report
    }

    /// Claim the run slot for the project and run the sequence in the
    /// background. A run already in flight for the same project is rejected.
    pub async fn start(
        &self,
        runs: &RunRegistry,
        project: ProjectData,
        credential: String,
    ) -> Result<tokio::task::JoinHandle<OrchestrationReport>, OrchestratorError> {
        let mut guard = runs.try_start(&project.id, self.event_bus.clone())?;
        self.statuses
            .set(
                &project.id,
                OrchestrationStatus::running(GenerationStep::Naming, 0),
            )
            .await;

        let service = self.clone();
        Ok(tokio::spawn(async move {
            let report = service.run(project, &credential).await;
            guard.mark_completed();
            report
        }))
    }

    /// Load the project and run the sequence on it
    pub async fn run_by_id(
        &self,
        project_id: &str,
        credential: &str,
    ) -> Result<OrchestrationReport, OrchestratorError> {
        let project = self.projects.get(project_id).await?;
        Ok(self.run(project, credential).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage_progression::StageProgression;
    use crate::test_support::ScriptedClient;
    use async_trait::async_trait;
    use db::{DbError, KeyValueStore, MemoryStore};
    use genai::GenAiError;
    use planwise_core::{
        FeaturePriority, OrchestrationPhase, ProjectUpdate, Questionnaire, StageStatus,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    struct Harness {
        client: Arc<ScriptedClient>,
        projects: ProjectStore,
        statuses: StatusBoard,
        service: OrchestrationService,
    }

    fn harness() -> Harness {
        let client = Arc::new(ScriptedClient::new());
        let projects = ProjectStore::new(Arc::new(MemoryStore::new()));
        let statuses = StatusBoard::new();
        let service = OrchestrationService::new(
            StageGenerator::new(client.clone()),
            projects.clone(),
            statuses.clone(),
        );
        Harness {
            client,
            projects,
            statuses,
            service,
        }
    }

    fn answers() -> Questionnaire {
        Questionnaire {
            platform: "web".to_string(),
            target_audience: String::new(),
            project_type: "todo app".to_string(),
            budget: "low".to_string(),
            timeline: "weeks".to_string(),
            experience: "beginner".to_string(),
        }
    }

    fn naming() -> serde_json::Value {
        json!({ "names": ["Tickr"], "slogans": ["Get it done"], "logoIdeas": ["a checkmark"] })
    }

    fn tech_stack() -> serde_json::Value {
        json!({
            "frontend": "React",
            "backend": "Supabase",
            "database": "Postgres",
            "hosting": "Vercel",
            "additionalTools": ["Tailwind"],
            "reasoning": "Cheap and quick to learn"
        })
    }

    fn features() -> serde_json::Value {
        json!({
            "features": [
                { "id": "f1", "name": "Quick add", "description": "Add a task", "priority": "high", "category": "core" },
                { "id": "f2", "name": "Due dates", "description": "Deadlines", "priority": "high", "category": "core" },
                { "id": "f3", "name": "Themes", "description": "Dark mode", "priority": "low", "category": "other" },
                { "id": "f4", "name": "Sharing", "description": "Share lists", "priority": "medium", "category": "social" }
            ]
        })
    }

    fn ui_style() -> serde_json::Value {
        json!({
            "designStyle": "Minimal",
            "colorPalette": { "primary": "#2563EB", "secondary": "#64748B", "accent": "#F59E0B", "background": "#FFFFFF", "text": "#0F172A" },
            "typography": { "headingFont": "Inter", "bodyFont": "Inter" },
            "keyComponents": ["Task card"],
            "principles": ["Clarity"]
        })
    }

    fn ui_flow() -> serde_json::Value {
        json!({
            "nodes": [
                { "id": "n1", "name": "Task list", "type": "screen", "connections": ["n2"] },
                { "id": "n2", "name": "Add task", "type": "action", "connections": ["n1"] }
            ]
        })
    }

    fn builder_tools() -> serde_json::Value {
        json!({ "tools": [{ "name": "Bolt", "url": "https://bolt.new", "category": "ai-assistant" }] })
    }

    fn deployment() -> serde_json::Value {
        json!({
            "recommended": "Vercel",
            "options": [{ "platform": "Vercel", "pros": ["Free tier"], "estimatedCost": "$0" }]
        })
    }

    fn script_all(client: &ScriptedClient) {
        client.push_json(naming());
        client.push_image_ok();
        client.push_json(tech_stack());
        client.push_json(features());
        client.push_json(ui_style());
        client.push_json(ui_flow());
        client.push_json(builder_tools());
        client.push_json(deployment());
    }

    #[tokio::test]
    async fn test_full_run_populates_every_stage() {
        let h = harness();
        script_all(&h.client);
        let project = h.projects.create(answers()).await.unwrap();

        let report = h.service.run(project.clone(), "key").await;

        assert!(report.is_success());
        assert_eq!(report.completed_steps, GenerationStep::SEQUENCE.to_vec());
        let data = &report.project;
        assert_eq!(data.name.as_deref(), Some("Tickr"));
        assert!(data.logo.as_deref().unwrap().starts_with("data:image/png"));
        assert_eq!(data.tech_stack.as_ref().unwrap().frontend, "React");
        assert_eq!(data.features.len(), 4);
        assert_eq!(data.decided_features.len(), 2);
        assert!(data
            .decided_features
            .iter()
            .all(|f| f.priority == FeaturePriority::High));
        assert!(data.ui_style.is_some());
        assert_eq!(data.ui_flow.len(), 2);
        assert_eq!(data.builder_tools.len(), 1);
        assert_eq!(data.deployment.as_ref().unwrap().recommended, "Vercel");

        let roadmap = StageProgression::roadmap(data);
        assert!(roadmap.iter().all(|v| v.status == StageStatus::Completed));

        // Persisted
        assert_eq!(&h.projects.get(&project.id).await.unwrap(), data);

        let status = h.statuses.get(&project.id).await;
        assert_eq!(status.phase, OrchestrationPhase::Completed);
        assert_eq!(status.progress, 100);
    }

    #[tokio::test]
    async fn test_steps_see_earlier_results() {
        let h = harness();
        script_all(&h.client);
        let project = h.projects.create(answers()).await.unwrap();

        h.service.run(project, "key").await;

        let prompts = h.client.prompts();
        assert_eq!(prompts.len(), 8);
        // logo prompt uses the chosen name and idea
        assert!(prompts[1].contains("\"Tickr\""));
        assert!(prompts[1].contains("a checkmark"));
        // UI design sees only the decided features
        assert!(prompts[4].contains("Quick add (high)"));
        assert!(!prompts[4].contains("Themes"));
        // deployment sees the stack and the tools
        assert!(prompts[7].contains("- Frontend: React"));
        assert!(prompts[7].contains("Builder tools: Bolt"));
    }

    #[tokio::test]
    async fn test_failure_at_step_three_keeps_earlier_results() {
        let h = harness();
        h.client.push_json(naming());
        h.client.push_image_ok();
        h.client.push_json_err(GenAiError::Api {
            status: 500,
            message: "network down".to_string(),
        });
        h.client.push_json(features());

        let project = h.projects.create(answers()).await.unwrap();
        let report = h.service.run(project.clone(), "key").await;

        assert_eq!(report.failed_step, Some(GenerationStep::TechStack));
        assert_eq!(
            report.completed_steps,
            vec![GenerationStep::Naming, GenerationStep::Logo]
        );
        assert!(report.error.is_some());
        // steps 4-7 never called
        assert_eq!(h.client.json_calls(), 2);

        let stored = h.projects.get(&project.id).await.unwrap();
        assert_eq!(stored.name.as_deref(), Some("Tickr"));
        assert!(stored.logo.is_some());
        assert!(stored.tech_stack.is_none());
        assert!(stored.features.is_empty());

        let status = h.statuses.get(&project.id).await;
        assert_eq!(status.phase, OrchestrationPhase::CompletedWithErrors);
        assert_eq!(status.step, Some(GenerationStep::TechStack));
    }

    #[tokio::test]
    async fn test_logo_failure_is_swallowed() {
        let h = harness();
        h.client.push_json(naming());
        h.client
            .push_image_err(GenAiError::InvalidCredential("nope".to_string()));
        h.client.push_json(tech_stack());
        h.client.push_json(features());
        h.client.push_json(ui_style());
        h.client.push_json(ui_flow());
        h.client.push_json(builder_tools());
        h.client.push_json(deployment());

        let project = h.projects.create(answers()).await.unwrap();
        let report = h.service.run(project, "key").await;

        assert!(report.is_success());
        assert_eq!(report.skipped_steps, vec![GenerationStep::Logo]);
        assert!(report.project.logo.is_none());
        assert!(report.project.deployment.is_some());
        assert_eq!(h.client.image_calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_step_is_a_failed_step() {
        let h = harness();
        h.client.push_json(naming());
        h.client.push_image_ok();
        h.client.push_json(tech_stack());
        h.client.push_json(json!({ "features": 42 }));

        let project = h.projects.create(answers()).await.unwrap();
        let report = h.service.run(project, "key").await;

        assert_eq!(report.failed_step, Some(GenerationStep::Features));
        assert!(report.project.tech_stack.is_some());
        assert!(report.project.features.is_empty());
    }

    #[tokio::test]
    async fn test_empty_naming_falls_back() {
        let h = harness();
        h.client.push_json(json!({}));
        h.client.push_image_err(GenAiError::EmptyResponse);
        h.client.push_json_err(GenAiError::Api {
            status: 500,
            message: "stop here".to_string(),
        });

        let project = h.projects.create(answers()).await.unwrap();
        let report = h.service.run(project, "key").await;
        assert_eq!(report.project.name.as_deref(), Some("My Project"));
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let h = harness();
        script_all(&h.client);
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = h.service.clone().with_event_bus(bus);

        let project = h.projects.create(answers()).await.unwrap();
        service.run(project, "key").await;

        let mut types = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            types.push(envelope.event.event_type());
        }
        assert_eq!(types.first(), Some(&"generation.started"));
        assert_eq!(types.last(), Some(&"generation.finished"));
        assert_eq!(
            types.iter().filter(|t| **t == "generation.step_completed").count(),
            8
        );
        assert_eq!(
            types.iter().filter(|t| **t == "generation.progress").count(),
            8
        );
    }

    #[tokio::test]
    async fn test_start_rejects_concurrent_run() {
        let h = harness();
        script_all(&h.client);
        let runs = RunRegistry::new();
        let project = h.projects.create(answers()).await.unwrap();

        let _held = runs.try_start(&project.id, None).unwrap();
        let err = h
            .service
            .start(&runs, project.clone(), "key".to_string())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, OrchestratorError::AlreadyRunning(_)));
        assert_eq!(h.client.json_calls(), 0);
    }

    #[tokio::test]
    async fn test_start_releases_slot_when_done() {
        let h = harness();
        script_all(&h.client);
        let runs = RunRegistry::new();
        let project = h.projects.create(answers()).await.unwrap();

        let handle = h
            .service
            .start(&runs, project.clone(), "key".to_string())
            .await
            .unwrap();
        assert!(runs.is_running(&project.id));

        let report = handle.await.unwrap();
        assert!(report.is_success());
        assert!(!runs.is_running(&project.id));
    }

    #[tokio::test]
    async fn test_run_by_id_missing_project() {
        let h = harness();
        assert!(matches!(
            h.service.run_by_id("nope", "key").await,
            Err(OrchestratorError::ProjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_project_deleted_mid_run_is_not_written_back() {
        let h = harness();
        script_all(&h.client);
        let project = h.projects.create(answers()).await.unwrap();

        let projects = h.projects.clone();
        let id = project.id.clone();
        h.client.during_json_call(2, move || async move {
            assert!(projects.delete(&id).await.unwrap());
        });

        let report = h.service.run(project.clone(), "key").await;

        assert_eq!(report.failed_step, Some(GenerationStep::TechStack));
        assert!(h.projects.load(&project.id).await.unwrap().is_none());
        assert_eq!(h.client.json_calls(), 2);
        assert_eq!(
            h.statuses.get(&project.id).await.phase,
            OrchestrationPhase::Idle
        );
    }

    #[tokio::test]
    async fn test_edits_during_run_are_kept() {
        let h = harness();
        script_all(&h.client);
        let project = h.projects.create(answers()).await.unwrap();

        let projects = h.projects.clone();
        let id = project.id.clone();
        h.client.during_json_call(2, move || async move {
            let update = ProjectUpdate {
                name: Some("User Edit".to_string()),
                ..Default::default()
            };
            projects.update(&id, update).await.unwrap();
        });

        let report = h.service.run(project.clone(), "key").await;

        assert!(report.is_success());
        let stored = h.projects.get(&project.id).await.unwrap();
        assert_eq!(stored.name.as_deref(), Some("User Edit"));
        assert_eq!(stored.tech_stack.as_ref().unwrap().frontend, "React");
        assert!(stored.deployment.is_some());
        // later prompts see the edit
        assert!(h.client.prompts()[7].contains("User Edit"));
    }

    /// Fails every write after the first `allowed`
    struct FailingWrites {
        inner: MemoryStore,
        allowed: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for FailingWrites {
        async fn get(&self, key: &str) -> Result<Option<String>, DbError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
            let left = self.allowed.load(Ordering::SeqCst);
            if left == 0 {
                return Err(DbError::InvalidKey(key.to_string()));
            }
            self.allowed.store(left - 1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<bool, DbError> {
            self.inner.delete(key).await
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
            self.inner.list_keys(prefix).await
        }
    }

    #[tokio::test]
    async fn test_save_failure_after_logo_stops_the_run() {
        let client = Arc::new(ScriptedClient::new());
        script_all(&client);
        // create + naming succeed, the logo save fails
        let store = Arc::new(FailingWrites {
            inner: MemoryStore::new(),
            allowed: AtomicUsize::new(2),
        });
        let projects = ProjectStore::new(store);
        let statuses = StatusBoard::new();
        let service = OrchestrationService::new(
            StageGenerator::new(client.clone()),
            projects.clone(),
            statuses.clone(),
        );
        let project = projects.create(answers()).await.unwrap();

        let report = service.run(project.clone(), "key").await;

        assert_eq!(report.failed_step, Some(GenerationStep::Logo));
        assert!(report.skipped_steps.is_empty());
        assert_eq!(report.completed_steps, vec![GenerationStep::Naming]);
        assert_eq!(client.json_calls(), 1);
        assert_eq!(
            statuses.get(&project.id).await.phase,
            OrchestrationPhase::CompletedWithErrors
        );
    }
}
