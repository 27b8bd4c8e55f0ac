use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{GenAiError, GenAiResult};
use crate::types::GeneratedImage;

/// A generative AI backend. Every call carries the user's credential.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Free-form text completion
    async fn generate_text(&self, prompt: &str, credential: &str) -> GenAiResult<String>;

    /// JSON-mode completion, parsed into a JSON value
    async fn generate_json(&self, prompt: &str, credential: &str)
        -> GenAiResult<serde_json::Value>;

    async fn generate_image(&self, prompt: &str, credential: &str)
        -> GenAiResult<GeneratedImage>;
}

/// JSON-mode call decoded into `T`. A response that does not fit the schema
/// is a `Parse` error.
pub async fn generate_structured<T>(
    client: &dyn GenerativeClient,
    prompt: &str,
    credential: &str,
) -> GenAiResult<T>
where
    T: DeserializeOwned,
{
    let value = client.generate_json(prompt, credential).await?;
    serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, schema = std::any::type_name::<T>(), "Response does not match schema");
        GenAiError::Parse(e.to_string())
    })
}

/// Pull a JSON document out of model output.
///
/// JSON mode usually returns a bare document, but models still wrap it in a
/// fenced code block or surround it with prose now and then.
pub fn extract_json(text: &str) -> GenAiResult<serde_json::Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenAiError::EmptyResponse);
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(block) = extract_from_codeblock(trimmed) {
        debug!("Found JSON in code block");
        return serde_json::from_str(block)
            .map_err(|e| GenAiError::Parse(format!("Invalid JSON in code block: {}", e)));
    }

    if let Some(raw) = extract_raw(trimmed) {
        return serde_json::from_str(raw)
            .map_err(|e| GenAiError::Parse(format!("Invalid raw JSON: {}", e)));
    }

    Err(GenAiError::Parse(format!(
        "No JSON found in response ({} chars)",
        trimmed.len()
    )))
}

fn extract_from_codeblock(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn extract_raw(text: &str) -> Option<&str> {
    let object = text.find('{').zip(text.rfind('}'));
    let array = text.find('[').zip(text.rfind(']'));

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if a.0 < o.0 {
                a
            } else {
                o
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    (start < end).then(|| &text[start..=end])
}
