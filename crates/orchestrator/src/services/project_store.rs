//! Project persistence on top of a key-value store.
//!
//! Each project is one JSON document under `project-<id>`; listing
//! enumerates the prefix.

use std::sync::Arc;

use db::KeyValueStore;
use planwise_core::{ProjectData, ProjectSummary, ProjectUpdate, Questionnaire};
use tracing::{debug, info, warn};

use crate::error::{OrchestratorError, Result};

pub const PROJECT_KEY_PREFIX: &str = "project-";

pub fn project_key(id: &str) -> String {
    format!("{}{}", PROJECT_KEY_PREFIX, id)
}

#[derive(Clone)]
pub struct ProjectStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProjectStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Validate answers and persist a fresh project
    pub async fn create(&self, answers: Questionnaire) -> Result<ProjectData> {
        answers.validate()?;
        let project = ProjectData::from_questionnaire(answers);
        self.save(&project).await?;
        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    pub async fn save(&self, project: &ProjectData) -> Result<()> {
        let json = serde_json::to_string(project)?;
        self.store.set(&project_key(&project.id), &json).await?;
        debug!(project_id = %project.id, bytes = json.len(), "Project saved");
        Ok(())
    }

    pub async fn load(&self, id: &str) -> Result<Option<ProjectData>> {
        match self.store.get(&project_key(id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Like `load`, but a missing project is an error
    pub async fn get(&self, id: &str) -> Result<ProjectData> {
        self.load(id)
            .await?
            .ok_or_else(|| OrchestratorError::ProjectNotFound(id.to_string()))
    }

    /// Shallow-merge `update` into the stored project
    pub async fn update(&self, id: &str, update: ProjectUpdate) -> Result<ProjectData> {
        let mut project = self.get(id).await?;
        project.merge(update);
        self.save(&project).await?;
        Ok(project)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let existed = self.store.delete(&project_key(id)).await?;
        if existed {
            info!(project_id = %id, "Project deleted");
        }
        Ok(existed)
    }

    /// Summaries of every stored project, most recently updated first.
    /// Entries that no longer parse are skipped.
    pub async fn list(&self) -> Result<Vec<ProjectSummary>> {
        let keys = self.store.list_keys(PROJECT_KEY_PREFIX).await?;
        let mut summaries = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(json) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<ProjectData>(&json) {
                Ok(project) => summaries.push(project.summary()),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable project"),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Pretty JSON of the stored project, as written to an export file
    pub async fn export_json(&self, id: &str) -> Result<String> {
        let project = self.get(id).await?;
        Ok(serde_json::to_string_pretty(&project)?)
    }

    /// Store an exported project as a new one: fresh id, name marked imported
    pub async fn import_json(&self, json: &str) -> Result<ProjectData> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| OrchestratorError::InvalidImport(e.to_string()))?;
        if !value.is_object() {
            return Err(OrchestratorError::InvalidImport(
                "expected a JSON object".to_string(),
            ));
        }

        let exported: ProjectData = serde_json::from_value(value)
            .map_err(|e| OrchestratorError::InvalidImport(e.to_string()))?;
        let project = exported.imported_copy();
        self.save(&project).await?;

        info!(
            project_id = %project.id,
            source_id = %exported.id,
            "Project imported"
        );
        Ok(project)
    }
}
