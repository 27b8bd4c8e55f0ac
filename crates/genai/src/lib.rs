//! Generative AI client adapter
//!
//! Text, JSON and image generation against the Gemini API, with typed
//! decoding of JSON responses and bounded backoff for image calls.

mod client;
mod error;
mod gemini;
mod retry;
pub mod types;

pub use client::{extract_json, generate_structured, GenerativeClient};
pub use error::{GenAiError, GenAiResult};
pub use gemini::{
    GeminiClient, GenAiConfig, RetrySettings, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL,
    DEFAULT_TEXT_MODEL,
};
pub use retry::{generate_image_with_retry, RetryPolicy};
pub use types::GeneratedImage;
