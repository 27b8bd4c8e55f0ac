use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::client::{extract_json, GenerativeClient};
use crate::error::{GenAiError, GenAiResult};
use crate::retry::RetryPolicy;
use crate::types::*;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Endpoint, models and image retry settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenAiConfig {
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub retry: RetrySettings,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        RetryPolicy::new(
            settings.max_attempts,
            Duration::from_millis(settings.base_delay_ms),
        )
    }
}

/// Client for the Gemini `generateContent` REST API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GenAiConfig,
}

impl GeminiClient {
    pub fn new(config: GenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.config.retry.into()
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        credential: &str,
    ) -> GenAiResult<GenerateContentResponse> {
        if credential.trim().is_empty() {
            return Err(GenAiError::InvalidCredential("no API key provided".to_string()));
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );
        debug!(model = model, "Calling generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            let err = GenAiError::from_status(status.as_u16(), message);
            if err.is_retryable() {
                warn!(status = status.as_u16(), error = %err, "Gemini request throttled");
            } else {
                error!(status = status.as_u16(), error = %err, "Gemini request failed");
            }
            return Err(err);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Unexpected generateContent response");
            GenAiError::Parse(format!("Invalid response body: {}", e))
        })
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_text(&self, prompt: &str, credential: &str) -> GenAiResult<String> {
        let request = GenerateContentRequest::prompt(prompt);
        let response = self
            .generate_content(&self.config.text_model, &request, credential)
            .await?;
        response.text().ok_or(GenAiError::EmptyResponse)
    }

    async fn generate_json(
        &self,
        prompt: &str,
        credential: &str,
    ) -> GenAiResult<serde_json::Value> {
        let request = GenerateContentRequest::prompt(prompt).json_mode();
        let response = self
            .generate_content(&self.config.text_model, &request, credential)
            .await?;
        let text = response.text().ok_or(GenAiError::EmptyResponse)?;
        extract_json(&text)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        credential: &str,
    ) -> GenAiResult<GeneratedImage> {
        let request = GenerateContentRequest::prompt(prompt).image_mode();
        let response = self
            .generate_content(&self.config.image_model, &request, credential)
            .await?;
        response
            .image()
            .cloned()
            .map(GeneratedImage::from)
            .ok_or(GenAiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GenAiConfig {
            base_url: server.uri(),
            ..Default::default()
        })
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn test_generate_json_sends_key_and_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response(r#"{"names":["Tickr"],"slogans":["Do it"]}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let value = client.generate_json("name it", "secret").await.unwrap();
        assert_eq!(value["names"][0], "Tickr");
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Hello")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.generate_text("hi", "secret").await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_generate_image_uses_image_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", DEFAULT_IMAGE_MODEL)))
            .and(body_partial_json(json!({
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [
                        { "text": "A minimal checkmark logo" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                    ]}
                }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let image = client.generate_image("logo", "secret").await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_image_without_inline_data_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("no image")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_image("logo", "secret").await.unwrap_err();
        assert!(matches!(err, GenAiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_error_classification_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_text("hi", "bad").await.unwrap_err();
        assert!(matches!(err, GenAiError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_overloaded_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_json("hi", "secret").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_non_json_reply_in_json_mode_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Sorry, no.")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_json("hi", "secret").await.unwrap_err();
        assert!(matches!(err, GenAiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_credential_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("x")))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_text("hi", "  ").await.unwrap_err();
        assert!(matches!(err, GenAiError::InvalidCredential(_)));
    }

    #[test]
    fn test_config_defaults_from_partial_toml_shape() {
        let config: GenAiConfig =
            serde_json::from_value(json!({ "text_model": "gemini-pro", "retry": { "max_attempts": 5 } }))
                .unwrap();
        assert_eq!(config.text_model, "gemini-pro");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 2000);
    }
}
