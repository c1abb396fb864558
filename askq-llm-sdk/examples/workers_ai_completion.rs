use askq_llm_sdk::client::LlmClient;
use askq_llm_sdk::types::CompletionRequest;
use askq_llm_sdk::workers_ai::WorkersAiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let account_id = std::env::var("CLOUDFLARE_ACCOUNT_ID")
        .map_err(|_| "CLOUDFLARE_ACCOUNT_ID environment variable must be set")?;
    let api_token = std::env::var("CLOUDFLARE_API_TOKEN")
        .map_err(|_| "CLOUDFLARE_API_TOKEN environment variable must be set")?;

    let client = WorkersAiClient::new(account_id, api_token)?;

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Explain quantum computing in simple terms.".to_string());
    let response = client
        .complete(CompletionRequest::from_user(question))
        .await?;

    println!("{} ({}): {}", client.provider_name(), client.model_name(), response.text);
    if let Some(usage) = response.usage {
        println!(
            "Usage: {} input tokens, {} output tokens",
            usage.input_tokens, usage.output_tokens
        );
    }

    Ok(())
}
