//! Event types published while projects are created, edited and generated

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type")]
pub enum Event {
    /// Questionnaire submitted and project record created
    #[serde(rename = "project.created")]
    ProjectCreated { project_id: String },

    /// Project data changed through a partial update
    #[serde(rename = "project.updated")]
    ProjectUpdated { project_id: String },

    #[serde(rename = "project.deleted")]
    ProjectDeleted { project_id: String },

    /// User explicitly marked a stage as completed
    #[serde(rename = "stage.marked_completed")]
    StageMarkedCompleted { project_id: String, stage: String },

    /// Automatic orchestration run started
    #[serde(rename = "generation.started")]
    GenerationStarted { project_id: String },

    /// A generation step began
    #[serde(rename = "generation.progress")]
    GenerationProgress {
        project_id: String,
        step: String,
        progress: u8,
        message: String,
    },

    /// A generation step merged its result into the project
    #[serde(rename = "generation.step_completed")]
    StepCompleted { project_id: String, step: String },

    /// A generation step failed
    #[serde(rename = "generation.step_failed")]
    StepFailed {
        project_id: String,
        step: String,
        error: String,
        /// Whether the run carried on past the failure
        skipped: bool,
    },

    /// Orchestration run ended
    #[serde(rename = "generation.finished")]
    GenerationFinished {
        project_id: String,
        with_errors: bool,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the project ID associated with this event, if any
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Event::ProjectCreated { project_id }
            | Event::ProjectUpdated { project_id }
            | Event::ProjectDeleted { project_id }
            | Event::StageMarkedCompleted { project_id, .. }
            | Event::GenerationStarted { project_id }
            | Event::GenerationProgress { project_id, .. }
            | Event::StepCompleted { project_id, .. }
            | Event::StepFailed { project_id, .. }
            | Event::GenerationFinished { project_id, .. } => Some(project_id.as_str()),
            Event::Error { .. } => None,
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ProjectCreated { .. } => "project.created",
            Event::ProjectUpdated { .. } => "project.updated",
            Event::ProjectDeleted { .. } => "project.deleted",
            Event::StageMarkedCompleted { .. } => "stage.marked_completed",
            Event::GenerationStarted { .. } => "generation.started",
            Event::GenerationProgress { .. } => "generation.progress",
            Event::StepCompleted { .. } => "generation.step_completed",
            Event::StepFailed { .. } => "generation.step_failed",
            Event::GenerationFinished { .. } => "generation.finished",
            Event::Error { .. } => "error",
        }
    }
}
