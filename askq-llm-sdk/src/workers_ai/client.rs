use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use crate::{
    error::LlmError,
    http::{build_http_client, error_from_response},
    types::{CompletionRequest, CompletionResponse},
    workers_ai::types::{WorkersAiRequest, WorkersAiResponse},
};

/// Cloudflare Workers AI client
pub struct WorkersAiClient {
    account_id: String,
    api_token: String,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl WorkersAiClient {
    /// Create a new client for the given account and API token
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Result<Self, LlmError> {
        let account_id = account_id.into();
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(LlmError::authentication("API token cannot be empty"));
        }
        if account_id.is_empty() {
            return Err(LlmError::invalid_request("Account id cannot be empty"));
        }

        Ok(Self {
            account_id,
            api_token,
            base_url: "https://api.cloudflare.com/client/v4".to_string(),
            model: crate::workers_ai::DEFAULT_MODEL.to_string(),
            http_client: build_http_client(Duration::from_secs(30))?,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
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

    fn run_url(&self, model: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            model
        )
    }

    /// Run a text-generation model
    pub async fn run(
        &self,
        model: &str,
        request: &WorkersAiRequest,
    ) -> Result<WorkersAiResponse, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_token))
                .map_err(|_| LlmError::authentication("Invalid API token format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .http_client
            .post(self.run_url(model))
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network { source: e })?;

        if !response.status().is_success() {
            return Err(error_from_response(response, |body| {
                serde_json::from_str::<WorkersAiResponse>(body)
                    .ok()
                    .filter(|r| !r.errors.is_empty())
                    .map(|r| r.error_message())
            })
            .await);
        }

        let body = response.text().await?;
        let parsed: WorkersAiResponse = serde_json::from_str(&body)?;
        if !parsed.success {
            return Err(LlmError::api_error(200, parsed.error_message()));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl crate::client::LlmClient for WorkersAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.unwrap_or_else(|| self.model.clone());
        let workers_request = WorkersAiRequest {
            messages: request.messages,
            max_tokens: request.max_tokens,
        };

        let response = self.run(&model, &workers_request).await?;
        let text = response
            .result
            .and_then(|r| r.response)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::empty_response("Workers AI returned no text"))?;

        Ok(CompletionResponse { text, usage: None })
    }

    fn provider_name(&self) -> &str {
        crate::providers::WORKERS_AI
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
