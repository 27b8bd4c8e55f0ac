use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::project::Position;

/// The seven planning stages, in roadmap order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    /// Name, slogan and logo
    NameLogo,
    /// Technology stack
    StackSelect,
    /// Feature list and selection
    FeatureBrainstorm,
    /// Visual design direction
    UiDesign,
    /// Screen/action/decision flow
    UiFlow,
    /// Builder tool recommendations
    BuilderTools,
    /// Deployment plan
    Deployment,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        Self::NameLogo,
        Self::StackSelect,
        Self::FeatureBrainstorm,
        Self::UiDesign,
        Self::UiFlow,
        Self::BuilderTools,
        Self::Deployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameLogo => "name-logo",
            Self::StackSelect => "stack-select",
            Self::FeatureBrainstorm => "feature-brainstorm",
            Self::UiDesign => "ui-design",
            Self::UiFlow => "ui-flow",
            Self::BuilderTools => "builder-tools",
            Self::Deployment => "deployment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|stage| stage.as_str() == wanted)
    }

    /// Zero-based position in the roadmap
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|stage| stage == self)
            .unwrap_or_default()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::NameLogo => "Name & Logo",
            Self::StackSelect => "Tech Stack",
            Self::FeatureBrainstorm => "Features",
            Self::UiDesign => "UI Design",
            Self::UiFlow => "UI Flow",
            Self::BuilderTools => "Builder Tools",
            Self::Deployment => "Deployment",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::NameLogo => "Pick a name, a slogan and a logo for the project",
            Self::StackSelect => "Choose the frontend, backend, database and hosting",
            Self::FeatureBrainstorm => "Brainstorm features and decide what to build",
            Self::UiDesign => "Settle on colors, typography and visual style",
            Self::UiFlow => "Map the screens, actions and decisions users go through",
            Self::BuilderTools => "Find tools that can build the app for you",
            Self::Deployment => "Plan where and how the app goes live",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::NameLogo => "sparkles",
            Self::StackSelect => "layers",
            Self::FeatureBrainstorm => "lightbulb",
            Self::UiDesign => "palette",
            Self::UiFlow => "git-branch",
            Self::BuilderTools => "wrench",
            Self::Deployment => "rocket",
        }
    }

    /// Roadmap position: a zig-zag path across the canvas
    pub fn position(&self) -> Position {
        let i = self.index() as f64;
        let y = if self.index() % 2 == 0 { 120.0 } else { 280.0 };
        Position::new(80.0 + i * 180.0, y)
    }

    pub fn definition(&self) -> RoadmapStage {
        RoadmapStage {
            id: *self,
            title: self.title().to_string(),
            description: self.description().to_string(),
            icon: self.icon().to_string(),
            position: self.position(),
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static definition of a roadmap stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RoadmapStage {
    pub id: StageId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub position: Position,
}

/// All stage definitions in roadmap order
pub fn roadmap_stages() -> Vec<RoadmapStage> {
    StageId::ALL.iter().map(StageId::definition).collect()
}

/// Derived status of a stage. Never stored; recomputed from project data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Locked,
    Available,
    Completed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Completed => "completed",
        }
    }

    pub fn is_unlocked(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// A stage definition together with its computed status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    #[serde(flatten)]
    pub stage: RoadmapStage,
    pub status: StageStatus,
    /// Whether the stage's data predicate holds
    pub data_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ids_round_trip() {
        for stage in StageId::ALL {
            assert_eq!(StageId::parse(stage.as_str()), Some(stage));
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
        assert_eq!(StageId::parse("unknown"), None);
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(StageId::NameLogo.index(), 0);
        assert_eq!(StageId::Deployment.index(), 6);

        let stages = roadmap_stages();
        assert_eq!(stages.len(), 7);
        assert_eq!(stages[2].id, StageId::FeatureBrainstorm);
        assert_eq!(stages[2].title, "Features");
    }

    #[test]
    fn test_positions_advance_left_to_right() {
        let xs: Vec<f64> = StageId::ALL.iter().map(|s| s.position().x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }
}
