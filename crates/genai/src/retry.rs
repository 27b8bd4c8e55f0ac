use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::GenerativeClient;
use crate::error::GenAiResult;
use crate::types::GeneratedImage;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 2000;

/// Bounded exponential backoff: attempt `n` (1-based) waits
/// `base_delay * 2^(n-1)` before the next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, operation: F) -> GenAiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GenAiResult<T>>,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(operation = operation_name, attempt, "Succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        "Retrying (attempt {}/{})",
                        attempt + 1,
                        self.max_attempts
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Giving up after retries"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Image generation wrapped in the retry policy. Text and JSON calls are
/// single-attempt.
pub async fn generate_image_with_retry(
    client: &dyn GenerativeClient,
    prompt: &str,
    credential: &str,
    policy: &RetryPolicy,
) -> GenAiResult<GeneratedImage> {
    policy
        .run("generate_image", || client.generate_image(prompt, credential))
        .await
}
