//! Project documentation assembled from an AI-generated JSON blob and
//! rendered to Markdown for download or clipboard export.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DocumentedFeature {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDocumentation {
    pub overview: String,
    pub target_audience: String,
    pub tech_stack: String,
    pub features: Vec<DocumentedFeature>,
    pub user_flow: String,
    pub setup_steps: Vec<String>,
    pub deployment: String,
    pub next_steps: Vec<String>,
}

impl ProjectDocumentation {
    /// Render as a Markdown document titled `title`. Empty sections are left out.
    pub fn to_markdown(&self, title: &str, slogan: Option<&str>) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# {}", title);
        if let Some(slogan) = slogan.filter(|s| !s.trim().is_empty()) {
            let _ = writeln!(md, "\n_{}_", slogan);
        }

        push_section(&mut md, "Overview", &self.overview);
        push_section(&mut md, "Target Audience", &self.target_audience);
        push_section(&mut md, "Tech Stack", &self.tech_stack);

        if !self.features.is_empty() {
            md.push_str("\n## Features\n\n");
            for feature in &self.features {
                if feature.description.trim().is_empty() {
                    let _ = writeln!(md, "- **{}**", feature.name);
                } else {
                    let _ = writeln!(md, "- **{}**: {}", feature.name, feature.description);
                }
            }
        }

        push_section(&mut md, "User Flow", &self.user_flow);

        if !self.setup_steps.is_empty() {
            md.push_str("\n## Getting Started\n\n");
            for (i, step) in self.setup_steps.iter().enumerate() {
                let _ = writeln!(md, "{}. {}", i + 1, step);
            }
        }

        push_section(&mut md, "Deployment", &self.deployment);

        if !self.next_steps.is_empty() {
            md.push_str("\n## Next Steps\n\n");
            for step in &self.next_steps {
                let _ = writeln!(md, "- [ ] {}", step);
            }
        }

        md
    }

    /// Download file name derived from the project name
    pub fn file_name(project_name: &str) -> String {
        format!("{}-docs.md", slugify(project_name))
    }
}

/// Lowercase ASCII slug for download names; `project` when nothing is left
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}

fn push_section(md: &mut String, heading: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    let _ = write!(md, "\n## {}\n\n{}\n", heading, body.trim());
}
