use askq_llm_sdk::client::LlmClient;
use askq_llm_sdk::error::LlmError;
use askq_llm_sdk::types::CompletionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Answer generation failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("Answer generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces the answer text stored alongside a question
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, AnswerError>;

    /// Short label used in logs and the health endpoint
    fn mode(&self) -> &str;
}

/// Language of the simulated answer template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

/// Deterministic placeholder answers; no external calls
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnswerer {
    locale: Locale,
}

impl SimulatedAnswerer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn render(&self, question: &str) -> String {
        match self.locale {
            Locale::En => format!("this is a simulated answer about '{}'", question),
            Locale::Zh => format!("AI回答：这是关于\"{}\"的模拟回答", question),
        }
    }
}

#[async_trait]
impl AnswerGenerator for SimulatedAnswerer {
    async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        Ok(self.render(question))
    }

    fn mode(&self) -> &str {
        "simulated"
    }
}

/// Delegates to the external reasoning agent under an overall deadline.
///
/// Retries belong to the client (see `RetryingClient`); the deadline here covers all of them.
pub struct AgentAnswerer {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl AgentAnswerer {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AnswerGenerator for AgentAnswerer {
    async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let started = Instant::now();
        let request = CompletionRequest::from_user(question);

        let response = tokio::time::timeout(self.timeout, self.client.complete(request))
            .await
            .map_err(|_| {
                error!(
                    provider = self.client.provider_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Agent did not answer in time"
                );
                AnswerError::Timeout(self.timeout)
            })?
            .map_err(|e| {
                error!(error = %e, provider = self.client.provider_name(), "Agent call failed");
                AnswerError::Upstream(e)
            })?;

        debug!(
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Agent answered"
        );

        Ok(response.text)
    }

    fn mode(&self) -> &str {
        "agent"
    }
}
