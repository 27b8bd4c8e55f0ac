use std::sync::Arc;

use genai::{generate_structured, GenerativeClient};
use planwise_core::{ProjectData, ProjectDocumentation};
use tracing::info;

use crate::error::Result;
use crate::prompts;
use crate::schemas::DocumentationResult;

/// Markdown export of a project, ready to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownExport {
    pub file_name: String,
    pub content: String,
}

/// Builds the documentation blob and its Markdown rendering
#[derive(Clone)]
pub struct DocumentationService {
    client: Arc<dyn GenerativeClient>,
}

impl DocumentationService {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self { client }
    }

    pub async fn generate(
        &self,
        project: &ProjectData,
        credential: &str,
    ) -> Result<ProjectDocumentation> {
        let prompt = prompts::documentation_prompt(project)?;
        let docs: DocumentationResult =
            generate_structured(self.client.as_ref(), &prompt, credential).await?;

        info!(
            project_id = %project.id,
            features = docs.features.len(),
            "Documentation generated"
        );
        Ok(docs)
    }

    /// Markdown for a project that already has documentation
    pub fn markdown(project: &ProjectData) -> Option<MarkdownExport> {
        let docs = project.documentation.as_ref()?;
        let name = project.display_name();
        Some(MarkdownExport {
            file_name: ProjectDocumentation::file_name(name),
            content: docs.to_markdown(name, project.slogan.as_deref()),
        })
    }
}
