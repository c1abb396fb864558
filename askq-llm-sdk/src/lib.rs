//! # askq LLM SDK
//!
//! Clients for the external reasoning agent that answers questions submitted to askq.
//! Every client speaks the same contract: a list of `{ role, content }` messages in,
//! generated `text` out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use askq_llm_sdk::agent::HttpAgentClient;
//! use askq_llm_sdk::client::LlmClient;
//! use askq_llm_sdk::retry::{RetryPolicy, RetryingClient};
//! use askq_llm_sdk::types::CompletionRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = HttpAgentClient::new("http://localhost:8787/answer")?;
//!     let client = RetryingClient::new(Arc::new(agent), RetryPolicy::default());
//!     let response = client
//!         .complete(CompletionRequest::from_user("What is 2+2?"))
//!         .await?;
//!
//!     println!("Answer: {}", response.text);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod client;
pub mod error;
mod http;
pub mod providers;
pub mod retry;
pub mod types;
pub mod workers_ai;

#[cfg(test)]
mod tests {
    use crate::agent::HttpAgentClient;
    use crate::client::LlmClient;
    use crate::workers_ai::WorkersAiClient;

    #[test]
    fn test_agent_client_creation() {
        let client = HttpAgentClient::new("http://localhost:8787/answer");
        assert!(client.is_ok());
    }

    #[test]
    fn test_agent_client_creation_empty_endpoint() {
        let client = HttpAgentClient::new("");
        assert!(client.is_err());
    }

    #[test]
    fn test_agent_client_model_override() {
        let client = HttpAgentClient::new("http://localhost:8787/answer")
            .unwrap()
            .with_model("qa-small");
        assert_eq!(client.model_name(), "qa-small");
    }

    #[test]
    fn test_workers_ai_client_creation() {
        let client = WorkersAiClient::new("account", "token");
        assert!(client.is_ok());
    }
}
