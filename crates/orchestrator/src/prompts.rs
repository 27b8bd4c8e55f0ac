//! Prompt templates for each generation step.
//!
//! Templates use `{placeholder}` markers filled from the accumulated project
//! state, so later steps see what earlier steps produced.

use planwise_core::{Feature, ProjectData, TechStack};

pub const NAMING_PROMPT: &str = r#"You are a branding expert helping a first-time builder name their project.

Project details:
- Platform: {platform}
- Project type: {project_type}
- Target audience: {target_audience}
- Budget: {budget}
- Timeline: {timeline}
- Builder experience: {experience}

Suggest 5 short, memorable product names, 3 slogans and 3 logo concepts.

Respond with JSON only, in exactly this shape:
{
  "names": ["Name"],
  "slogans": ["Slogan"],
  "logoIdeas": ["Short visual description of a logo"]
}"#;

pub const LOGO_PROMPT: &str = r#"Design a simple, modern app logo for "{name}", a {project_type} for {platform}.
{slogan_line}Concept: {logo_idea}
Flat vector style, centered icon on a plain background, no text, works at small sizes."#;

pub const TECH_STACK_PROMPT: &str = r#"You are a senior software architect advising a builder with {experience} experience.

Project: {name}, a {project_type} for {platform}
Target audience: {target_audience}
Budget: {budget}
Timeline: {timeline}

Recommend one technology stack that fits the budget, the timeline and the builder's experience.

Respond with JSON only, in exactly this shape:
{
  "frontend": "Framework or tool",
  "backend": "Framework, service or 'none'",
  "database": "Database or 'none'",
  "hosting": "Hosting provider",
  "additionalTools": ["Tool"],
  "reasoning": "Two or three sentences explaining the choice"
}"#;

pub const FEATURES_PROMPT: &str = r#"You are a product manager brainstorming features for {name}, a {project_type} for {platform}.

Target audience: {target_audience}
Timeline: {timeline}
Tech stack: {tech_stack}

List 8 to 12 features. Mark the ones needed for a first release as "high" priority, nice-to-haves as "medium" and later ideas as "low".

Respond with JSON only, in exactly this shape:
{
  "features": [
    {
      "id": "feature-1",
      "name": "Feature name",
      "description": "One sentence",
      "priority": "high|medium|low",
      "category": "core|social|monetization|admin|other"
    }
  ]
}"#;

pub const UI_DESIGN_PROMPT: &str = r##"You are a UI designer creating the visual direction for {name}, a {project_type} for {platform}.

Target audience: {target_audience}
Features to support:
{features}

Respond with JSON only, in exactly this shape:
{
  "designStyle": "Short name of the visual style",
  "colorPalette": {
    "primary": "#RRGGBB",
    "secondary": "#RRGGBB",
    "accent": "#RRGGBB",
    "background": "#RRGGBB",
    "text": "#RRGGBB"
  },
  "typography": { "headingFont": "Font", "bodyFont": "Font" },
  "keyComponents": ["Component"],
  "principles": ["Design principle"]
}"##;

pub const UI_FLOW_PROMPT: &str = r#"You are a UX designer mapping how users move through {name}, a {project_type} for {platform}.

Features to cover:
{features}

Describe the flow as a graph of screens, user actions and decisions. Every connection must be the id of another node in the list.

Respond with JSON only, in exactly this shape:
{
  "nodes": [
    {
      "id": "node-1",
      "name": "Node name",
      "type": "screen|action|decision",
      "description": "What happens here",
      "connections": ["node-2"]
    }
  ]
}"#;

pub const BUILDER_TOOLS_PROMPT: &str = r#"You are advising a builder with {experience} experience and a {budget} budget.

They want to build {name}, a {project_type} for {platform}, on this stack:
{tech_stack}

Recommend 4 to 6 no-code, low-code or AI-assisted tools that would help them build it.

Respond with JSON only, in exactly this shape:
{
  "tools": [
    {
      "name": "Tool",
      "description": "What it does for this project",
      "url": "https://...",
      "category": "no-code|low-code|ai-assistant|backend-as-a-service|design",
      "pricing": "Free tier / price",
      "bestFor": "When to use it"
    }
  ]
}"#;

pub const DEPLOYMENT_PROMPT: &str = r#"You are a DevOps engineer planning how to launch {name}, a {project_type} for {platform}.

Budget: {budget}
Tech stack:
{tech_stack}
Builder tools: {builder_tools}

Compare 2 or 3 deployment options and recommend one.

Respond with JSON only, in exactly this shape:
{
  "recommended": "Platform name of the recommended option",
  "options": [
    {
      "platform": "Platform",
      "description": "One sentence",
      "pros": ["Pro"],
      "cons": ["Con"],
      "estimatedCost": "$0-20/month",
      "steps": ["Step"]
    }
  ]
}"#;

pub const DOCUMENTATION_PROMPT: &str = r#"You are a technical writer producing a project brief for {name}{slogan_suffix}.

Everything decided so far, as JSON:
{project_json}

Write clear, beginner-friendly documentation.

Respond with JSON only, in exactly this shape:
{
  "overview": "Paragraph",
  "targetAudience": "Paragraph",
  "techStack": "Paragraph",
  "features": [{ "name": "Feature", "description": "One sentence" }],
  "userFlow": "Paragraph",
  "setupSteps": ["Step"],
  "deployment": "Paragraph",
  "nextSteps": ["Step"]
}"#;

const NOT_DECIDED: &str = "not decided yet";

/// Replace `{key}` markers in `template` in one pass. Inserted values are
/// never rescanned, and braces that aren't a known marker are kept.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let marker = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });

        match marker {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        "not specified"
    } else {
        value
    }
}

fn describe_stack(stack: Option<&TechStack>) -> String {
    match stack {
        Some(stack) => {
            let mut lines = vec![
                format!("- Frontend: {}", stack.frontend),
                format!("- Backend: {}", stack.backend),
                format!("- Database: {}", stack.database),
                format!("- Hosting: {}", stack.hosting),
            ];
            if !stack.additional_tools.is_empty() {
                lines.push(format!("- Other: {}", stack.additional_tools.join(", ")));
            }
            lines.join("\n")
        }
        None => NOT_DECIDED.to_string(),
    }
}

fn describe_features(features: &[Feature]) -> String {
    if features.is_empty() {
        return NOT_DECIDED.to_string();
    }
    features
        .iter()
        .map(|f| format!("- {} ({}): {}", f.name, f.priority.as_str(), f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn base_values(project: &ProjectData) -> Vec<(&'static str, String)> {
    vec![
        ("name", project.display_name().to_string()),
        ("platform", or_unspecified(&project.platform).to_string()),
        ("project_type", or_unspecified(&project.project_type).to_string()),
        ("target_audience", or_unspecified(&project.target_audience).to_string()),
        ("budget", or_unspecified(&project.budget).to_string()),
        ("timeline", or_unspecified(&project.timeline).to_string()),
        ("experience", or_unspecified(&project.experience).to_string()),
    ]
}

fn render(template: &str, project: &ProjectData, extra: Vec<(&'static str, String)>) -> String {
    let mut values = base_values(project);
    values.extend(extra);
    let borrowed: Vec<(&str, &str)> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
    fill(template, &borrowed)
}

pub fn naming_prompt(project: &ProjectData) -> String {
    render(NAMING_PROMPT, project, Vec::new())
}

pub fn logo_prompt(project: &ProjectData, logo_idea: Option<&str>) -> String {
    let slogan_line = match project.slogan.as_deref() {
        Some(slogan) if !slogan.trim().is_empty() => format!("Slogan: \"{}\"\n", slogan),
        _ => String::new(),
    };
    let idea = logo_idea
        .filter(|idea| !idea.trim().is_empty())
        .unwrap_or("a clean symbol that reflects what the app does");

    render(
        LOGO_PROMPT,
        project,
        vec![("slogan_line", slogan_line), ("logo_idea", idea.to_string())],
    )
}

pub fn tech_stack_prompt(project: &ProjectData) -> String {
    render(TECH_STACK_PROMPT, project, Vec::new())
}

pub fn features_prompt(project: &ProjectData) -> String {
    render(
        FEATURES_PROMPT,
        project,
        vec![("tech_stack", describe_stack(project.tech_stack.as_ref()))],
    )
}

/// Uses the decided features, falling back to everything brainstormed
fn selected_features(project: &ProjectData) -> &[Feature] {
    if project.decided_features.is_empty() {
        &project.features
    } else {
        &project.decided_features
    }
}

pub fn ui_design_prompt(project: &ProjectData) -> String {
    render(
        UI_DESIGN_PROMPT,
        project,
        vec![("features", describe_features(selected_features(project)))],
    )
}

pub fn ui_flow_prompt(project: &ProjectData) -> String {
    render(
        UI_FLOW_PROMPT,
        project,
        vec![("features", describe_features(selected_features(project)))],
    )
}

pub fn builder_tools_prompt(project: &ProjectData) -> String {
    render(
        BUILDER_TOOLS_PROMPT,
        project,
        vec![("tech_stack", describe_stack(project.tech_stack.as_ref()))],
    )
}

pub fn deployment_prompt(project: &ProjectData) -> String {
    let tools = if project.builder_tools.is_empty() {
        NOT_DECIDED.to_string()
    } else {
        project
            .builder_tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    render(
        DEPLOYMENT_PROMPT,
        project,
        vec![
            ("tech_stack", describe_stack(project.tech_stack.as_ref())),
            ("builder_tools", tools),
        ],
    )
}

/// The project JSON is embedded without the logo, which can be megabytes of base64.
pub fn documentation_prompt(project: &ProjectData) -> Result<String, serde_json::Error> {
    let mut snapshot = project.clone();
    snapshot.logo = None;
    snapshot.documentation = None;
    let project_json = serde_json::to_string_pretty(&snapshot)?;

    let slogan_suffix = match project.slogan.as_deref() {
        Some(slogan) if !slogan.trim().is_empty() => format!(" (\"{}\")", slogan),
        _ => String::new(),
    };

    Ok(render(
        DOCUMENTATION_PROMPT,
        project,
        vec![("project_json", project_json), ("slogan_suffix", slogan_suffix)],
    ))
}
