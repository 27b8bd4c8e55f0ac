use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::documentation::{slugify, ProjectDocumentation};
use crate::domain::stage::StageId;
use crate::error::CoreError;

/// Name used when the naming stage produced nothing usable
pub const FALLBACK_PROJECT_NAME: &str = "My Project";

/// Suffix appended to the name of an imported project
pub const IMPORTED_SUFFIX: &str = " (Imported)";

// ============================================
// Enums
// ============================================

/// Priority of a brainstormed feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum FeaturePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl FeaturePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Kind of node in the UI flow graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum FlowNodeType {
    /// A screen or page the user sees
    #[default]
    Screen,
    /// Something the user does (submit, tap, swipe)
    Action,
    /// A branch point (logged in? has items?)
    Decision,
}

impl FlowNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Action => "action",
            Self::Decision => "decision",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "screen" | "page" => Some(Self::Screen),
            "action" => Some(Self::Action),
            "decision" | "condition" => Some(Self::Decision),
            _ => None,
        }
    }
}

// ============================================
// AI-derived records
// ============================================

/// A feature proposed during brainstorming
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: FeaturePriority,
    #[serde(default)]
    pub category: String,
}

/// 2D canvas position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node in the UI flow graph. Connections reference other node ids in the
/// same project; cycles are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: FlowNodeType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub position: Position,
}

/// Recommended technology stack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TechStack {
    pub frontend: String,
    pub backend: String,
    pub database: String,
    pub hosting: String,
    #[serde(default)]
    pub additional_tools: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(default)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
}

/// Visual design direction for the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UiStyle {
    pub design_style: String,
    #[serde(default)]
    pub color_palette: ColorPalette,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default)]
    pub key_components: Vec<String>,
    #[serde(default)]
    pub principles: Vec<String>,
}

/// A no-code / low-code / AI builder recommended for the stack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BuilderTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub pricing: String,
    #[serde(default)]
    pub best_for: String,
}

/// One hosting/deployment route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOption {
    pub platform: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub estimated_cost: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Deployment recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DeploymentPlan {
    /// Platform name of the recommended option
    pub recommended: String,
    #[serde(default)]
    pub options: Vec<DeploymentOption>,
}

impl DeploymentPlan {
    pub fn recommended_option(&self) -> Option<&DeploymentOption> {
        self.options
            .iter()
            .find(|o| o.platform.eq_ignore_ascii_case(&self.recommended))
            .or_else(|| self.options.first())
    }
}

// ============================================
// Project aggregate
// ============================================

/// Answers collected by the questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Questionnaire {
    pub platform: String,
    pub target_audience: String,
    pub project_type: String,
    pub budget: String,
    pub timeline: String,
    pub experience: String,
}

impl Questionnaire {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.platform.trim().is_empty() {
            return Err(CoreError::Validation("platform is required".to_string()));
        }
        if self.project_type.trim().is_empty() {
            return Err(CoreError::Validation("projectType is required".to_string()));
        }
        Ok(())
    }
}

/// Everything known about one planning session. A missing AI-derived field
/// means that stage has not been generated yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub experience: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slogan: Option<String>,
    /// Logo as a `data:` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<TechStack>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decided_features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_style: Option<UiStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui_flow: Vec<FlowNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub builder_tools: Vec<BuilderTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<ProjectDocumentation>,

    /// Stages the user explicitly marked as completed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_stages: Vec<StageId>,
}

fn default_now() -> DateTime<Utc> {
    Utc::now()
}

/// Time-ordered project id with a random suffix so two projects created in
/// the same millisecond never collide.
pub fn new_project_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

impl ProjectData {
    /// Create the project record for a submitted questionnaire
    pub fn from_questionnaire(answers: Questionnaire) -> Self {
        let now = Utc::now();
        Self {
            id: new_project_id(),
            created_at: now,
            updated_at: now,
            platform: answers.platform,
            target_audience: answers.target_audience,
            project_type: answers.project_type,
            budget: answers.budget,
            timeline: answers.timeline,
            experience: answers.experience,
            name: None,
            slogan: None,
            logo: None,
            tech_stack: None,
            features: Vec::new(),
            decided_features: Vec::new(),
            ui_style: None,
            ui_flow: Vec::new(),
            builder_tools: Vec::new(),
            deployment: None,
            documentation: None,
            completed_stages: Vec::new(),
        }
    }

    pub fn questionnaire(&self) -> Questionnaire {
        Questionnaire {
            platform: self.platform.clone(),
            target_audience: self.target_audience.clone(),
            project_type: self.project_type.clone(),
            budget: self.budget.clone(),
            timeline: self.timeline.clone(),
            experience: self.experience.clone(),
        }
    }

    /// Name for display, falling back when naming has not run
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => FALLBACK_PROJECT_NAME,
        }
    }

    /// Shallow-merge a partial update. Fields absent from the update are left
    /// untouched; decided features no longer present in `features` are dropped.
    pub fn merge(&mut self, update: ProjectUpdate) {
        if let Some(v) = update.platform {
            self.platform = v;
        }
        if let Some(v) = update.target_audience {
            self.target_audience = v;
        }
        if let Some(v) = update.project_type {
            self.project_type = v;
        }
        if let Some(v) = update.budget {
            self.budget = v;
        }
        if let Some(v) = update.timeline {
            self.timeline = v;
        }
        if let Some(v) = update.experience {
            self.experience = v;
        }
        if let Some(v) = update.name {
            self.name = Some(v);
        }
        if let Some(v) = update.slogan {
            self.slogan = Some(v);
        }
        if let Some(v) = update.logo {
            self.logo = Some(v);
        }
        if let Some(v) = update.tech_stack {
            self.tech_stack = Some(v);
        }
        if let Some(v) = update.features {
            self.features = v;
        }
        if let Some(v) = update.decided_features {
            self.decided_features = v;
        }
        if let Some(v) = update.ui_style {
            self.ui_style = Some(v);
        }
        if let Some(v) = update.ui_flow {
            self.ui_flow = v;
        }
        if let Some(v) = update.builder_tools {
            self.builder_tools = v;
        }
        if let Some(v) = update.deployment {
            self.deployment = Some(v);
        }
        if let Some(v) = update.documentation {
            self.documentation = Some(v);
        }

        self.retain_known_decided_features();
        self.updated_at = Utc::now();
    }

    fn retain_known_decided_features(&mut self) {
        let features = &self.features;
        self.decided_features
            .retain(|decided| features.iter().any(|f| f.id == decided.id));
    }

    /// Replace the decided features with the features carrying `ids`
    pub fn decide_features(&mut self, ids: &[String]) -> Result<(), CoreError> {
        let mut decided = Vec::with_capacity(ids.len());
        for id in ids {
            let feature = self
                .features
                .iter()
                .find(|f| &f.id == id)
                .ok_or_else(|| CoreError::FeatureNotFound(id.clone()))?;
            if !decided.iter().any(|d: &Feature| d.id == feature.id) {
                decided.push(feature.clone());
            }
        }
        self.decided_features = decided;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_marked_completed(&self, stage: StageId) -> bool {
        self.completed_stages.contains(&stage)
    }

    /// Record an explicit "mark completed" override for a stage
    pub fn mark_stage_completed(&mut self, stage: StageId) {
        if !self.completed_stages.contains(&stage) {
            self.completed_stages.push(stage);
            self.updated_at = Utc::now();
        }
    }

    /// Copy of this project as it should be stored after an import: a fresh id
    /// and a name marked as imported.
    pub fn imported_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.id = new_project_id();
        copy.name = self
            .name
            .as_ref()
            .map(|name| format!("{}{}", name, IMPORTED_SUFFIX));
        copy
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.display_name().to_string(),
            slogan: self.slogan.clone(),
            platform: self.platform.clone(),
            project_type: self.project_type.clone(),
            has_logo: self.logo.is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Download name for a JSON export
    pub fn export_file_name(&self) -> String {
        format!("{}.json", slugify(self.display_name()))
    }
}

/// Partial update emitted by a stage editor or a generation step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub platform: Option<String>,
    pub target_audience: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub experience: Option<String>,
    pub name: Option<String>,
    pub slogan: Option<String>,
    pub logo: Option<String>,
    pub tech_stack: Option<TechStack>,
    pub features: Option<Vec<Feature>>,
    pub decided_features: Option<Vec<Feature>>,
    pub ui_style: Option<UiStyle>,
    pub ui_flow: Option<Vec<FlowNode>>,
    pub builder_tools: Option<Vec<BuilderTool>>,
    pub deployment: Option<DeploymentPlan>,
    pub documentation: Option<ProjectDocumentation>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Dashboard entry for a saved project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub slogan: Option<String>,
    pub platform: String,
    pub project_type: String,
    pub has_logo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Tests
// ============================================
