//! Typed shapes of the JSON each generation step asks for.
//!
//! Every field is lenient on input; coercion into domain records happens in
//! `into_update`, never by trusting the model's output as-is.

use std::collections::HashSet;

use planwise_core::{
    BuilderTool, ColorPalette, DeploymentOption, DeploymentPlan, Feature, FeaturePriority,
    FlowNode, FlowNodeType, Position, ProjectDocumentation, ProjectUpdate, TechStack, Typography,
    UiStyle, FALLBACK_PROJECT_NAME,
};
use serde::Deserialize;

const FLOW_COLUMNS: usize = 4;
const FLOW_COLUMN_WIDTH: f64 = 250.0;
const FLOW_ROW_HEIGHT: f64 = 150.0;

fn first_non_empty(values: &[String]) -> Option<String> {
    values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NamingResult {
    pub names: Vec<String>,
    pub slogans: Vec<String>,
    pub logo_ideas: Vec<String>,
}

impl NamingResult {
    pub fn logo_idea(&self) -> Option<String> {
        first_non_empty(&self.logo_ideas)
    }

    /// First suggested name and slogan; the name falls back to a placeholder
    pub fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            name: Some(
                first_non_empty(&self.names).unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string()),
            ),
            slogan: first_non_empty(&self.slogans),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TechStackResult {
    pub frontend: String,
    pub backend: String,
    pub database: String,
    pub hosting: String,
    pub additional_tools: Vec<String>,
    pub reasoning: String,
}

impl TechStackResult {
    pub fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            tech_stack: Some(TechStack {
                frontend: self.frontend,
                backend: self.backend,
                database: self.database,
                hosting: self.hosting,
                additional_tools: self.additional_tools,
                reasoning: self.reasoning,
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFeature {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub priority: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FeaturesResult {
    pub features: Vec<RawFeature>,
}

impl FeaturesResult {
    /// Unnamed entries are dropped, missing or repeated ids replaced and
    /// unknown priorities read as medium.
    pub fn into_features(self) -> Vec<Feature> {
        let mut seen = HashSet::new();
        let mut features = Vec::with_capacity(self.features.len());

        for (i, raw) in self.features.into_iter().enumerate() {
            let name = raw.name.trim().to_string();
            if name.is_empty() {
                continue;
            }

            let id = raw
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty() && !seen.contains(id))
                .unwrap_or_else(|| unique_id(&seen, "feature", i + 1));
            seen.insert(id.clone());

            features.push(Feature {
                id,
                name,
                description: raw.description,
                priority: FeaturePriority::parse(&raw.priority).unwrap_or_default(),
                category: raw.category,
            });
        }

        features
    }

    /// The features, with the high-priority ones decided
    pub fn into_update(self) -> ProjectUpdate {
        let features = self.into_features();
        let decided = features
            .iter()
            .filter(|f| f.priority == FeaturePriority::High)
            .cloned()
            .collect();

        ProjectUpdate {
            features: Some(features),
            decided_features: Some(decided),
            ..Default::default()
        }
    }
}

fn unique_id(seen: &HashSet<String>, prefix: &str, start: usize) -> String {
    (start..)
        .map(|n| format!("{}-{}", prefix, n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| format!("{}-{}", prefix, start))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UiStyleResult {
    pub design_style: String,
    pub color_palette: ColorPalette,
    pub typography: Typography,
    pub key_components: Vec<String>,
    pub principles: Vec<String>,
}

impl UiStyleResult {
    pub fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            ui_style: Some(UiStyle {
                design_style: self.design_style,
                color_palette: self.color_palette,
                typography: self.typography,
                key_components: self.key_components,
                principles: self.principles,
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFlowNode {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub description: String,
    pub connections: Vec<String>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UiFlowResult {
    pub nodes: Vec<RawFlowNode>,
}

impl UiFlowResult {
    /// Connections to ids outside the graph are dropped; cycles are kept.
    /// Nodes without a position are laid out on a grid.
    pub fn into_nodes(self) -> Vec<FlowNode> {
        let mut seen = HashSet::new();
        let mut nodes: Vec<FlowNode> = Vec::with_capacity(self.nodes.len());

        for (i, raw) in self.nodes.into_iter().enumerate() {
            let name = raw.name.trim().to_string();
            if name.is_empty() {
                continue;
            }

            let id = raw
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty() && !seen.contains(id))
                .unwrap_or_else(|| unique_id(&seen, "node", i + 1));
            seen.insert(id.clone());

            let index = nodes.len();
            let position = raw.position.unwrap_or_else(|| {
                Position::new(
                    (index % FLOW_COLUMNS) as f64 * FLOW_COLUMN_WIDTH,
                    (index / FLOW_COLUMNS) as f64 * FLOW_ROW_HEIGHT,
                )
            });

            nodes.push(FlowNode {
                id,
                name,
                node_type: FlowNodeType::parse(&raw.node_type).unwrap_or_default(),
                description: raw.description,
                connections: raw.connections,
                position,
            });
        }

        for node in &mut nodes {
            node.connections.retain(|target| seen.contains(target));
            let mut unique = HashSet::new();
            node.connections.retain(|target| unique.insert(target.clone()));
        }

        nodes
    }

    pub fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            ui_flow: Some(self.into_nodes()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BuilderToolsResult {
    pub tools: Vec<BuilderTool>,
}

impl BuilderToolsResult {
    pub fn into_update(self) -> ProjectUpdate {
        let tools = self
            .tools
            .into_iter()
            .filter(|t| !t.name.trim().is_empty())
            .collect();
        ProjectUpdate {
            builder_tools: Some(tools),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeploymentResult {
    pub recommended: String,
    pub options: Vec<DeploymentOption>,
}

impl DeploymentResult {
    /// A blank recommendation falls back to the first option
    pub fn into_update(self) -> ProjectUpdate {
        let recommended = if self.recommended.trim().is_empty() {
            self.options
                .first()
                .map(|o| o.platform.clone())
                .unwrap_or_default()
        } else {
            self.recommended
        };

        ProjectUpdate {
            deployment: Some(DeploymentPlan {
                recommended,
                options: self.options,
            }),
            ..Default::default()
        }
    }
}

/// Documentation JSON already matches the stored shape
pub type DocumentationResult = ProjectDocumentation;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_naming_fallback() {
        let result: NamingResult = serde_json::from_value(json!({ "names": [" ", ""] })).unwrap();
        let update = result.into_update();
        assert_eq!(update.name.as_deref(), Some(FALLBACK_PROJECT_NAME));
        assert!(update.slogan.is_none());

        let result: NamingResult = serde_json::from_value(json!({
            "names": ["Tickr", "Doit"],
            "slogans": ["Get it done"],
            "logoIdeas": ["a checkmark"]
        }))
        .unwrap();
        assert_eq!(result.logo_idea().as_deref(), Some("a checkmark"));
        let update = result.into_update();
        assert_eq!(update.name.as_deref(), Some("Tickr"));
        assert_eq!(update.slogan.as_deref(), Some("Get it done"));
    }

    #[test]
    fn test_features_coercion() {
        let result: FeaturesResult = serde_json::from_value(json!({
            "features": [
                { "id": "f1", "name": "Quick add", "priority": "HIGH" },
                { "name": "Sync", "priority": "urgent" },
                { "id": "f1", "name": "Dup id", "priority": "low" },
                { "name": "  " }
            ]
        }))
        .unwrap();

        let update = result.into_update();
        let features = update.features.unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].priority, FeaturePriority::High);
        assert_eq!(features[1].id, "feature-2");
        assert_eq!(features[1].priority, FeaturePriority::Medium);
        assert_eq!(features[2].id, "feature-3");

        let decided = update.decided_features.unwrap();
        assert_eq!(decided.len(), 1);
        assert_eq!(decided[0].id, "f1");
    }

    #[test]
    fn test_flow_drops_dangling_connections_and_lays_out() {
        let result: UiFlowResult = serde_json::from_value(json!({
            "nodes": [
                { "id": "a", "name": "Home", "type": "screen", "connections": ["b", "ghost", "b"] },
                { "id": "b", "name": "Add task", "type": "action", "connections": ["a"] },
                { "name": "Logged in?", "type": "weird", "position": { "x": 9.0, "y": 9.0 } },
                { "id": "d", "name": "D" },
                { "id": "e", "name": "E" }
            ]
        }))
        .unwrap();

        let nodes = result.into_nodes();
        assert_eq!(nodes[0].connections, vec!["b"]);
        assert_eq!(nodes[1].connections, vec!["a"]);
        assert_eq!(nodes[2].id, "node-3");
        assert_eq!(nodes[2].node_type, FlowNodeType::Screen);
        assert_eq!(nodes[2].position, Position::new(9.0, 9.0));
        assert_eq!(nodes[1].position, Position::new(250.0, 0.0));
        assert_eq!(nodes[4].position, Position::new(0.0, 150.0));
    }

    #[test]
    fn test_deployment_defaults_recommendation() {
        let result: DeploymentResult = serde_json::from_value(json!({
            "options": [{ "platform": "Vercel" }, { "platform": "Netlify" }]
        }))
        .unwrap();
        let plan = result.into_update().deployment.unwrap();
        assert_eq!(plan.recommended, "Vercel");
        assert_eq!(plan.options.len(), 2);
    }

    #[test]
    fn test_partial_ui_style() {
        let result: UiStyleResult = serde_json::from_value(json!({
            "designStyle": "Minimal",
            "colorPalette": { "primary": "#111111" }
        }))
        .unwrap();
        let style = result.into_update().ui_style.unwrap();
        assert_eq!(style.design_style, "Minimal");
        assert_eq!(style.color_palette.primary, "#111111");
        assert_eq!(style.color_palette.accent, "");
    }

    #[test]
    fn test_builder_tools_drop_unnamed() {
        let result: BuilderToolsResult = serde_json::from_value(json!({
            "tools": [{ "name": "Bolt", "bestFor": "Prototypes" }, { "name": "" }]
        }))
        .unwrap();
        let tools = result.into_update().builder_tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].best_for, "Prototypes");
    }
}
