//! One AI call per generation step, turned into a `ProjectUpdate`.

use std::sync::Arc;

use genai::{
    generate_image_with_retry, generate_structured, GenAiResult, GenerativeClient, RetryPolicy,
};
use planwise_core::{GenerationStep, ProjectData, ProjectUpdate, StageId};
use tracing::{debug, warn};

use crate::error::Result;
use crate::prompts;
use crate::schemas::*;

#[derive(Clone)]
pub struct StageGenerator {
    client: Arc<dyn GenerativeClient>,
    image_retry: RetryPolicy,
}

impl StageGenerator {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self {
            client,
            image_retry: RetryPolicy::default(),
        }
    }

    pub fn with_image_retry(mut self, policy: RetryPolicy) -> Self {
        self.image_retry = policy;
        self
    }

    pub fn client(&self) -> &Arc<dyn GenerativeClient> {
        &self.client
    }

    pub async fn naming(
        &self,
        project: &ProjectData,
        credential: &str,
    ) -> GenAiResult<NamingResult> {
        generate_structured(
            self.client.as_ref(),
            &prompts::naming_prompt(project),
            credential,
        )
        .await
    }

    /// Logo as a `data:` URL. The only call that retries.
    pub async fn logo(
        &self,
        project: &ProjectData,
        logo_idea: Option<&str>,
        credential: &str,
    ) -> GenAiResult<ProjectUpdate> {
        let image = generate_image_with_retry(
            self.client.as_ref(),
            &prompts::logo_prompt(project, logo_idea),
            credential,
            &self.image_retry,
        )
        .await?;

        Ok(ProjectUpdate {
            logo: Some(image.data_url()),
            ..Default::default()
        })
    }

    /// Run a single step against the current project state
    pub async fn generate_step(
        &self,
        step: GenerationStep,
        project: &ProjectData,
        credential: &str,
    ) -> GenAiResult<ProjectUpdate> {
        debug!(project_id = %project.id, step = %step, "Generating step");
        let client = self.client.as_ref();

        let update = match step {
            GenerationStep::Naming => self.naming(project, credential).await?.into_update(),
            GenerationStep::Logo => self.logo(project, None, credential).await?,
            GenerationStep::TechStack => {
                generate_structured::<TechStackResult>(
                    client,
                    &prompts::tech_stack_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
            GenerationStep::Features => {
                generate_structured::<FeaturesResult>(
                    client,
                    &prompts::features_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
            GenerationStep::UiDesign => {
                generate_structured::<UiStyleResult>(
                    client,
                    &prompts::ui_design_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
            GenerationStep::UiFlow => {
                generate_structured::<UiFlowResult>(
                    client,
                    &prompts::ui_flow_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
            GenerationStep::BuilderTools => {
                generate_structured::<BuilderToolsResult>(
                    client,
                    &prompts::builder_tools_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
            GenerationStep::Deployment => {
                generate_structured::<DeploymentResult>(
                    client,
                    &prompts::deployment_prompt(project),
                    credential,
                )
                .await?
                .into_update()
            }
        };

        Ok(update)
    }

    /// Regenerate one roadmap stage on demand.
    ///
    /// For name-logo the naming result feeds the logo prompt, and a failed
    /// logo leaves the stage without one instead of failing it.
    pub async fn generate_stage(
        &self,
        stage: StageId,
        project: &ProjectData,
        credential: &str,
    ) -> Result<ProjectUpdate> {
        let step = match stage {
            StageId::NameLogo => return self.generate_name_and_logo(project, credential).await,
            StageId::StackSelect => GenerationStep::TechStack,
            StageId::FeatureBrainstorm => GenerationStep::Features,
            StageId::UiDesign => GenerationStep::UiDesign,
            StageId::UiFlow => GenerationStep::UiFlow,
            StageId::BuilderTools => GenerationStep::BuilderTools,
            StageId::Deployment => GenerationStep::Deployment,
        };

        Ok(self.generate_step(step, project, credential).await?)
    }

    async fn generate_name_and_logo(
        &self,
        project: &ProjectData,
        credential: &str,
    ) -> Result<ProjectUpdate> {
        let naming = self.naming(project, credential).await?;
        let logo_idea = naming.logo_idea();
        let mut update = naming.into_update();

        let mut named = project.clone();
        named.merge(update.clone());

        match self.logo(&named, logo_idea.as_deref(), credential).await {
            Ok(logo) => update.logo = logo.logo,
            Err(e) => warn!(
                project_id = %project.id,
                error = %e,
                "Logo generation failed, keeping stage without a logo"
            ),
        }

        Ok(update)
    }
}
