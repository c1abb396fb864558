use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use crate::{
    agent::types::{AgentErrorResponse, AgentRequest, AgentResponse},
    error::LlmError,
    http::{build_http_client, error_from_response},
    types::{CompletionRequest, CompletionResponse},
};

/// Client for a generic reasoning agent reachable over HTTP.
///
/// The agent receives `{ "messages": [{ "role", "content" }] }` and answers with
/// `{ "text": "..." }`.
pub struct HttpAgentClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    http_client: reqwest::Client,
}

impl HttpAgentClient {
    /// Create a client posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LlmError> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(LlmError::invalid_request("Agent endpoint cannot be empty"));
        }

        Ok(Self {
            endpoint,
            api_key: None,
            model: "default".to_string(),
            http_client: build_http_client(Duration::from_secs(30))?,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Per-request HTTP timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.http_client = build_http_client(timeout)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a request to the agent endpoint
    pub async fn send(&self, request: &AgentRequest) -> Result<AgentResponse, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|_| LlmError::authentication("Invalid API key format"))?,
            );
        }

        debug!(endpoint = %self.endpoint, messages = request.messages.len(), "Calling agent");

        let response = self
            .http_client
            .post(&self.endpoint)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network { source: e })?;

        if response.status().is_success() {
            let body = response.text().await?;
            let agent_response: AgentResponse = serde_json::from_str(&body)?;
            Ok(agent_response)
        } else {
            Err(error_from_response(response, |body| {
                serde_json::from_str::<AgentErrorResponse>(body)
                    .ok()
                    .map(|e| e.error)
            })
            .await)
        }
    }
}

#[async_trait]
impl crate::client::LlmClient for HttpAgentClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let agent_request = AgentRequest {
            messages: request.messages,
            model: Some(request.model.unwrap_or_else(|| self.model.clone())),
            max_tokens: request.max_tokens,
        };

        let response = self.send(&agent_request).await?;
        if response.text.trim().is_empty() {
            return Err(LlmError::empty_response("Agent returned no text"));
        }

        Ok(CompletionResponse {
            text: response.text,
            usage: response.usage,
        })
    }

    fn provider_name(&self) -> &str {
        crate::providers::AGENT
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
