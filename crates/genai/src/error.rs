use thiserror::Error;

/// Failures of a generative AI call
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model overloaded: {0}")]
    Overloaded(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid API key: {0}")]
    InvalidCredential(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse model response: {0}")]
    Parse(String),

    #[error("Model returned no usable content")]
    EmptyResponse,
}

impl GenAiError {
    /// Classify a non-success HTTP response from the AI service
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("api key not valid")
            || lower.contains("api_key_invalid")
            || status == 401
            || status == 403
        {
            return Self::InvalidCredential(message);
        }
        if status == 429 {
            if lower.contains("quota") {
                return Self::QuotaExceeded(message);
            }
            return Self::RateLimited(message);
        }
        if status == 503 || lower.contains("overloaded") || lower.contains("unavailable") {
            return Self::Overloaded(message);
        }
        Self::Api { status, message }
    }

    /// Only rate limiting and overload are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Overloaded(_))
    }

    /// Message shown to the user in place of the raw error
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited(_) | Self::Overloaded(_) => {
                "The AI service is busy right now. Please wait a moment and try again.".to_string()
            }
            Self::QuotaExceeded(_) => {
                "Your API quota has been exceeded. Check your plan and billing details, or try again later."
                    .to_string()
            }
            Self::InvalidCredential(_) => {
                "Your API key is not valid. Please check it and save it again.".to_string()
            }
            Self::Network(_) => {
                "Could not reach the AI service. Check your internet connection and try again."
                    .to_string()
            }
            Self::Api { message, .. } => format!("The AI service returned an error: {}", message),
            Self::Parse(_) | Self::EmptyResponse => {
                "The AI returned a response that could not be understood. Please try again."
                    .to_string()
            }
        }
    }
}

/// Result type alias for AI calls
pub type GenAiResult<T> = Result<T, GenAiError>;
