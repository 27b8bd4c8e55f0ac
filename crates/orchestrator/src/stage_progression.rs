//! Stage completion and unlock rules for the roadmap.
//!
//! Nothing here is stored: statuses are recomputed from `ProjectData` on
//! every read. Unlocking is a strict linear chain over the data predicates;
//! an explicit "mark completed" only changes the label.

use planwise_core::{
    roadmap_stages, CoreError, ProjectData, RoadmapStage, StageId, StageStatus, StageView,
};

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

pub struct StageProgression;

impl StageProgression {
    /// Whether the data a stage produces is present
    pub fn is_stage_complete(stage: StageId, data: &ProjectData) -> bool {
        match stage {
            StageId::NameLogo => non_empty(&data.name) && non_empty(&data.slogan),
            StageId::StackSelect => data.tech_stack.is_some(),
            StageId::FeatureBrainstorm => !data.decided_features.is_empty(),
            StageId::UiDesign => data.ui_style.is_some(),
            StageId::UiFlow => !data.ui_flow.is_empty(),
            StageId::BuilderTools => !data.builder_tools.is_empty(),
            StageId::Deployment => data.deployment.is_some(),
        }
    }

    /// Stage 0 is always unlocked; stage i needs every earlier predicate to hold
    pub fn is_unlocked(stage: StageId, data: &ProjectData) -> bool {
        StageId::ALL[..stage.index()]
            .iter()
            .all(|earlier| Self::is_stage_complete(*earlier, data))
    }

    pub fn status(stage: StageId, data: &ProjectData) -> StageStatus {
        if !Self::is_unlocked(stage, data) {
            StageStatus::Locked
        } else if Self::is_stage_complete(stage, data) || data.is_marked_completed(stage) {
            StageStatus::Completed
        } else {
            StageStatus::Available
        }
    }

    /// Attach computed statuses to `stages`
    pub fn compute_availability(stages: &[RoadmapStage], data: &ProjectData) -> Vec<StageView> {
        stages
            .iter()
            .map(|stage| StageView {
                stage: stage.clone(),
                status: Self::status(stage.id, data),
                data_complete: Self::is_stage_complete(stage.id, data),
            })
            .collect()
    }

    /// The full roadmap for a project
    pub fn roadmap(data: &ProjectData) -> Vec<StageView> {
        Self::compute_availability(&roadmap_stages(), data)
    }

    /// First unlocked stage that is not completed yet
    pub fn next_stage(data: &ProjectData) -> Option<StageId> {
        StageId::ALL
            .into_iter()
            .find(|stage| Self::status(*stage, data) == StageStatus::Available)
    }

    /// Share of stages showing as completed, 0-100
    pub fn progress_percent(data: &ProjectData) -> u8 {
        let completed = StageId::ALL
            .iter()
            .filter(|stage| Self::status(**stage, data) == StageStatus::Completed)
            .count();
        ((completed * 100) / StageId::ALL.len()) as u8
    }

    pub fn can_mark_completed(stage: StageId, data: &ProjectData) -> Result<(), CoreError> {
        if Self::is_unlocked(stage, data) {
            Ok(())
        } else {
            Err(CoreError::StageLocked(stage.as_str().to_string()))
        }
    }

    /// Record the explicit completed label; locked stages are refused
    pub fn mark_completed(stage: StageId, data: &mut ProjectData) -> Result<(), CoreError> {
        Self::can_mark_completed(stage, data)?;
        data.mark_stage_completed(stage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planwise_core::{
        BuilderTool, DeploymentPlan, Feature, FeaturePriority, FlowNode, FlowNodeType, Position,
        Questionnaire, TechStack, UiStyle,
    };

    fn empty() -> ProjectData {
        ProjectData::from_questionnaire(Questionnaire {
            platform: "web".to_string(),
            project_type: "todo app".to_string(),
            ..Default::default()
        })
    }

    fn full() -> ProjectData {
        let mut data = empty();
        data.name = Some("Tickr".to_string());
        data.slogan = Some("Get it done".to_string());
        data.tech_stack = Some(TechStack::default());
        let feature = Feature {
            id: "f1".to_string(),
            name: "Quick add".to_string(),
            description: String::new(),
            priority: FeaturePriority::High,
            category: String::new(),
        };
        data.features = vec![feature.clone()];
        data.decided_features = vec![feature];
        data.ui_style = Some(UiStyle::default());
        data.ui_flow = vec![FlowNode {
            id: "n1".to_string(),
            name: "Home".to_string(),
            node_type: FlowNodeType::Screen,
            description: String::new(),
            connections: Vec::new(),
            position: Position::default(),
        }];
        data.builder_tools = vec![BuilderTool {
            name: "Bolt".to_string(),
            description: String::new(),
            url: String::new(),
            category: String::new(),
            pricing: String::new(),
            best_for: String::new(),
        }];
        data.deployment = Some(DeploymentPlan::default());
        data
    }

    #[test]
    fn test_stack_select_predicate() {
        let mut data = empty();
        assert!(!StageProgression::is_stage_complete(StageId::StackSelect, &data));
        data.tech_stack = Some(TechStack::default());
        assert!(StageProgression::is_stage_complete(StageId::StackSelect, &data));
    }

    #[test]
    fn test_feature_brainstorm_needs_decided_features() {
        let mut data = full();
        data.decided_features.clear();
        assert!(!StageProgression::is_stage_complete(
            StageId::FeatureBrainstorm,
            &data
        ));
        data.decided_features = data.features.clone();
        assert!(StageProgression::is_stage_complete(
            StageId::FeatureBrainstorm,
            &data
        ));
    }

    #[test]
    fn test_name_logo_needs_name_and_slogan() {
        let mut data = empty();
        data.name = Some("Tickr".to_string());
        assert!(!StageProgression::is_stage_complete(StageId::NameLogo, &data));
        data.slogan = Some("   ".to_string());
        assert!(!StageProgression::is_stage_complete(StageId::NameLogo, &data));
        data.slogan = Some("Get it done".to_string());
        assert!(StageProgression::is_stage_complete(StageId::NameLogo, &data));
    }

    #[test]
    fn test_first_stage_always_available() {
        let views = StageProgression::roadmap(&empty());
        assert_eq!(views[0].status, StageStatus::Available);
        assert!(views[1..].iter().all(|v| v.status == StageStatus::Locked));
    }

    #[test]
    fn test_linear_unlock_chain() {
        let mut data = empty();
        data.name = Some("Tickr".to_string());
        data.slogan = Some("Get it done".to_string());
        // Later data present but the chain is broken at stack-select
        data.ui_style = Some(UiStyle::default());

        let views = StageProgression::roadmap(&data);
        assert_eq!(views[0].status, StageStatus::Completed);
        assert_eq!(views[1].status, StageStatus::Available);
        assert_eq!(views[2].status, StageStatus::Locked);
        assert_eq!(views[3].status, StageStatus::Locked);
        assert!(views[3].data_complete);
        assert_eq!(StageProgression::next_stage(&data), Some(StageId::StackSelect));
    }

    #[test]
    fn test_available_implies_predecessors_complete() {
        let mut data = full();
        data.ui_flow.clear();

        for view in StageProgression::roadmap(&data) {
            if view.status.is_unlocked() {
                for earlier in &StageId::ALL[..view.stage.id.index()] {
                    assert!(StageProgression::is_stage_complete(*earlier, &data));
                }
            }
        }
    }

    #[test]
    fn test_mark_completed_is_label_only() {
        let mut data = empty();
        data.name = Some("Tickr".to_string());
        data.slogan = Some("Get it done".to_string());

        let before = StageProgression::roadmap(&data);
        StageProgression::mark_completed(StageId::StackSelect, &mut data).unwrap();
        let after = StageProgression::roadmap(&data);

        assert_eq!(after[1].status, StageStatus::Completed);
        assert!(!after[1].data_complete);
        // Unlocking still follows the predicates
        assert_eq!(after[2].status, StageStatus::Locked);
        for (b, a) in before.iter().zip(&after) {
            assert!(!(b.status.is_unlocked() && !a.status.is_unlocked()));
        }
    }

    #[test]
    fn test_locked_stage_cannot_be_marked() {
        let mut data = empty();
        let err = StageProgression::mark_completed(StageId::Deployment, &mut data).unwrap_err();
        assert!(matches!(err, CoreError::StageLocked(_)));
        assert!(data.completed_stages.is_empty());
    }

    #[test]
    fn test_full_project() {
        let data = full();
        assert!(StageProgression::roadmap(&data)
            .iter()
            .all(|v| v.status == StageStatus::Completed));
        assert_eq!(StageProgression::progress_percent(&data), 100);
        assert_eq!(StageProgression::next_stage(&data), None);
        assert_eq!(StageProgression::progress_percent(&empty()), 0);
    }
}
