use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::stage::StageId;

/// One AI call in the orchestration sequence, in execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    Naming,
    Logo,
    TechStack,
    Features,
    UiDesign,
    UiFlow,
    BuilderTools,
    Deployment,
}

impl GenerationStep {
    pub const SEQUENCE: [GenerationStep; 8] = [
        Self::Naming,
        Self::Logo,
        Self::TechStack,
        Self::Features,
        Self::UiDesign,
        Self::UiFlow,
        Self::BuilderTools,
        Self::Deployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Logo => "logo",
            Self::TechStack => "tech_stack",
            Self::Features => "features",
            Self::UiDesign => "ui_design",
            Self::UiFlow => "ui_flow",
            Self::BuilderTools => "builder_tools",
            Self::Deployment => "deployment",
        }
    }

    /// Roadmap stage this step populates
    pub fn stage(&self) -> StageId {
        match self {
            Self::Naming | Self::Logo => StageId::NameLogo,
            Self::TechStack => StageId::StackSelect,
            Self::Features => StageId::FeatureBrainstorm,
            Self::UiDesign => StageId::UiDesign,
            Self::UiFlow => StageId::UiFlow,
            Self::BuilderTools => StageId::BuilderTools,
            Self::Deployment => StageId::Deployment,
        }
    }

    /// Progress text shown while the step runs
    pub fn progress_message(&self) -> &'static str {
        match self {
            Self::Naming => "Brainstorming a name and slogan...",
            Self::Logo => "Designing a logo...",
            Self::TechStack => "Picking a tech stack...",
            Self::Features => "Brainstorming features...",
            Self::UiDesign => "Designing the user interface...",
            Self::UiFlow => "Mapping the user flow...",
            Self::BuilderTools => "Finding builder tools...",
            Self::Deployment => "Planning deployment...",
        }
    }

    /// Percentage reached once this step finishes
    pub fn progress_after(&self) -> u8 {
        let position = Self::SEQUENCE
            .iter()
            .position(|s| s == self)
            .unwrap_or_default();
        (((position + 1) * 100) / Self::SEQUENCE.len()) as u8
    }
}

impl std::fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the automatic orchestration run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationPhase {
    #[default]
    Idle,
    Running,
    Completed,
    /// A step failed; remaining steps were skipped and need manual regeneration
    CompletedWithErrors,
}

impl OrchestrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors)
    }
}

/// UI-visible progress of an orchestration run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationStatus {
    #[serde(default)]
    pub phase: OrchestrationPhase,
    /// Step currently running, or the step that failed
    #[serde(default)]
    pub step: Option<GenerationStep>,
    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl OrchestrationStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running(step: GenerationStep, progress: u8) -> Self {
        Self {
            phase: OrchestrationPhase::Running,
            step: Some(step),
            progress,
            message: step.progress_message().to_string(),
            error: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            phase: OrchestrationPhase::Completed,
            step: None,
            progress: 100,
            message: "Your project plan is ready!".to_string(),
            error: None,
        }
    }

    pub fn completed_with_errors(step: GenerationStep, progress: u8, error: impl Into<String>) -> Self {
        Self {
            phase: OrchestrationPhase::CompletedWithErrors,
            step: Some(step),
            progress,
            message: "Completed with errors. Regenerate the remaining stages manually."
                .to_string(),
            error: Some(error.into()),
        }
    }
}
