use crate::routes::sse::{EventBuffer, SharedEventBuffer, DEFAULT_EVENT_BUFFER_SIZE};
use db::KeyValueStore;
use events::{Event, EventBus};
use genai::{GeminiClient, GenAiConfig, GenerativeClient, RetryPolicy};
use orchestrator::{
    CredentialStore, DocumentationService, OrchestrationService, ProjectStore, RunRegistry,
    StageGenerator, StatusBoard,
};
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectStore,
    pub credentials: CredentialStore,
    pub generator: StageGenerator,
    pub documentation: DocumentationService,
    pub orchestration: OrchestrationService,
    pub runs: RunRegistry,
    pub statuses: StatusBoard,
    pub event_bus: EventBus,
    pub event_buffer: SharedEventBuffer,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, client: Arc<dyn GenerativeClient>) -> Self {
        Self::with_image_retry(store, client, RetryPolicy::default())
    }

    pub fn with_image_retry(
        store: Arc<dyn KeyValueStore>,
        client: Arc<dyn GenerativeClient>,
        image_retry: RetryPolicy,
    ) -> Self {
        let event_bus = EventBus::new();
        let event_buffer = Arc::new(RwLock::new(EventBuffer::new(DEFAULT_EVENT_BUFFER_SIZE)));

        let projects = ProjectStore::new(Arc::clone(&store));
        let credentials = CredentialStore::new(store);
        let generator = StageGenerator::new(Arc::clone(&client)).with_image_retry(image_retry);
        let documentation = DocumentationService::new(client);
        let statuses = StatusBoard::new();
        let orchestration =
            OrchestrationService::new(generator.clone(), projects.clone(), statuses.clone())
                .with_event_bus(event_bus.clone());

        Self {
            projects,
            credentials,
            generator,
            documentation,
            orchestration,
            runs: RunRegistry::new(),
            statuses,
            event_bus,
            event_buffer,
        }
    }

    /// State backed by the Gemini REST API
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: GenAiConfig) -> Self {
        let client = GeminiClient::new(config);
        let image_retry = client.retry_policy();
        Self::with_image_retry(store, Arc::new(client), image_retry)
    }

    pub fn emit(&self, event: Event) {
        self.event_bus.emit(event);
    }
}
