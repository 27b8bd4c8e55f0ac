//! Scripted `GenerativeClient` for tests

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use genai::{GenAiError, GenAiResult, GeneratedImage, GenerativeClient};

type Hook = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Replays queued responses in order and records every prompt it sees
#[derive(Default)]
pub struct ScriptedClient {
    json: Mutex<VecDeque<GenAiResult<serde_json::Value>>>,
    images: Mutex<VecDeque<GenAiResult<GeneratedImage>>>,
    prompts: Mutex<Vec<String>>,
    hooks: Mutex<Vec<(usize, Hook)>>,
    json_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.json.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_json_err(&self, error: GenAiError) {
        self.json.lock().unwrap().push_back(Err(error));
    }

    pub fn push_image_ok(&self) {
        self.images.lock().unwrap().push_back(Ok(GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "iVBORw0KGgo=".to_string(),
        }));
    }

    pub fn push_image_err(&self, error: GenAiError) {
        self.images.lock().unwrap().push_back(Err(error));
    }

    /// Run `hook` while the `call`-th JSON request (1-based) is in flight
    pub fn during_json_call<F, Fut>(&self, call: usize, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks
            .lock()
            .unwrap()
            .push((call, Box::new(move || Box::pin(hook()))));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn json_calls(&self) -> usize {
        self.json_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    fn record(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn generate_text(&self, prompt: &str, credential: &str) -> GenAiResult<String> {
        self.generate_json(prompt, credential)
            .await
            .map(|value| value.to_string())
    }

    async fn generate_json(
        &self,
        prompt: &str,
        _credential: &str,
    ) -> GenAiResult<serde_json::Value> {
        self.record(prompt);
        let call = self.json_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let hook = {
            let mut hooks = self.hooks.lock().unwrap();
            hooks
                .iter()
                .position(|(at, _)| *at == call)
                .map(|i| hooks.remove(i).1)
        };
        if let Some(hook) = hook {
            hook().await;
        }
        self.json
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GenAiError::Api {
                    status: 500,
                    message: "no scripted response left".to_string(),
                })
            })
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _credential: &str,
    ) -> GenAiResult<GeneratedImage> {
        self.record(prompt);
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenAiError::EmptyResponse))
    }
}
