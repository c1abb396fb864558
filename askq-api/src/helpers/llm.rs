use anyhow::{anyhow, bail, Context};
use askq_llm_sdk::agent::HttpAgentClient;
use askq_llm_sdk::client::LlmClient;
use askq_llm_sdk::providers;
use askq_llm_sdk::retry::RetryingClient;
use askq_llm_sdk::workers_ai::WorkersAiClient;
use std::sync::Arc;
use tracing::info;

use crate::answer::{AgentAnswerer, AnswerGenerator, SimulatedAnswerer};
use crate::config::{AgentConfig, AnswerMode, ApiConfig};

/// Build the configured agent client, wrapped with retries
pub fn create_llm_client(config: &AgentConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider.as_str() {
        providers::AGENT => {
            let endpoint = config
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow!("agent.base_url is required for the agent provider"))?;
            let mut client = HttpAgentClient::new(endpoint)?
                .with_request_timeout(config.request_timeout())
                .context("Failed to build agent HTTP client")?;
            if let Some(api_key) = &config.api_key {
                client = client.with_api_key(api_key);
            }
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        providers::WORKERS_AI => {
            let account_id = config
                .account_id
                .as_deref()
                .ok_or_else(|| anyhow!("agent.account_id is required for workers_ai"))?;
            let api_key = config
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow!("agent.api_key is required for workers_ai"))?;
            let mut client = WorkersAiClient::new(account_id, api_key)?
                .with_request_timeout(config.request_timeout())
                .context("Failed to build Workers AI client")?;
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url);
            }
            if let Some(model) = &config.model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        other => bail!(
            "Unknown agent provider '{}'. Options: {}, {}",
            other,
            providers::AGENT,
            providers::WORKERS_AI
        ),
    };

    Ok(Arc::new(RetryingClient::new(client, config.retry_policy())))
}

pub fn create_answer_generator(config: &ApiConfig) -> anyhow::Result<Arc<dyn AnswerGenerator>> {
    match config.answer.mode {
        AnswerMode::Simulated => {
            info!(locale = ?config.answer.locale, "Using simulated answers");
            Ok(Arc::new(SimulatedAnswerer::new(config.answer.locale)))
        }
        AnswerMode::Agent => {
            let client = create_llm_client(&config.agent)?;
            info!(
                provider = client.provider_name(),
                model = client.model_name(),
                timeout_secs = config.answer.timeout_secs,
                "Delegating answers to external agent"
            );
            Ok(Arc::new(AgentAnswerer::new(client, config.answer.timeout())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_provider_requires_base_url() {
        let err = create_llm_client(&AgentConfig::default()).err().unwrap();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_workers_ai_requires_credentials() {
        let config = AgentConfig {
            provider: providers::WORKERS_AI.to_string(),
            account_id: Some("acct".into()),
            ..AgentConfig::default()
        };
        let err = create_llm_client(&config).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = AgentConfig {
            provider: "oracle".into(),
            ..AgentConfig::default()
        };
        assert!(create_llm_client(&config).is_err());
    }

    #[test]
    fn test_builds_retrying_agent_client() {
        let config = AgentConfig {
            base_url: Some("http://localhost:7000/answer".into()),
            model: Some("small".into()),
            ..AgentConfig::default()
        };
        let client = create_llm_client(&config).unwrap();
        assert_eq!(client.provider_name(), providers::AGENT);
        assert_eq!(client.model_name(), "small");
    }

    #[test]
    fn test_default_answer_generator_is_simulated() {
        let generator = create_answer_generator(&ApiConfig::default()).unwrap();
        assert_eq!(generator.mode(), "simulated");
    }
}
