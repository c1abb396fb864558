use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::{
    client::LlmClient,
    error::LlmError,
    types::{CompletionRequest, CompletionResponse},
};

/// Exponential backoff settings for transient agent failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling and capped at `max_delay`.
    ///
    /// A `retry_after` hint from a 429 response is honored but still capped.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);

        match retry_after {
            Some(secs) => Duration::from_secs(secs).min(self.max_delay).max(exponential),
            None => exponential,
        }
    }
}

/// Wraps a client and retries transient failures with exponential backoff.
///
/// Non-transient errors (validation, authentication, empty answers) are returned immediately.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut attempt = 0;

        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let retry_after = match &e {
                        LlmError::RateLimit { retry_after, .. } => *retry_after,
                        _ => None,
                    };
                    let delay = self.policy.delay_for(attempt, retry_after);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        provider = self.inner.provider_name(),
                        "Transient agent failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
