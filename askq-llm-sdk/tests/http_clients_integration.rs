use askq_llm_sdk::agent::HttpAgentClient;
use askq_llm_sdk::client::LlmClient;
use askq_llm_sdk::error::LlmError;
use askq_llm_sdk::retry::{RetryPolicy, RetryingClient};
use askq_llm_sdk::types::CompletionRequest;
use askq_llm_sdk::workers_ai::WorkersAiClient;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_agent_client_sends_user_message_and_reads_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/answer")
        .match_header("content-type", "application/json")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "What is 2+2?"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"text":"2+2 is 4."}"#)
        .create_async()
        .await;

    let client = HttpAgentClient::new(format!("{}/answer", server.url()))
        .unwrap()
        .with_api_key("secret");

    let response = client
        .complete(CompletionRequest::from_user("What is 2+2?"))
        .await
        .unwrap();

    assert_eq!(response.text, "2+2 is 4.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_agent_client_maps_bad_request() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/answer")
        .with_status(400)
        .with_body(r#"{"error":"question too long"}"#)
        .create_async()
        .await;

    let client = HttpAgentClient::new(format!("{}/answer", server.url())).unwrap();
    let result = client.complete(CompletionRequest::from_user("x")).await;

    match result {
        Err(LlmError::InvalidRequest { message }) => assert_eq!(message, "question too long"),
        other => panic!("expected invalid request, got {:?}", other.map(|r| r.text)),
    }
}

#[tokio::test]
async fn test_agent_client_rejects_blank_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/answer")
        .with_status(200)
        .with_body(r#"{"text":"   "}"#)
        .create_async()
        .await;

    let client = HttpAgentClient::new(format!("{}/answer", server.url())).unwrap();
    let result = client.complete(CompletionRequest::from_user("x")).await;

    assert!(matches!(result, Err(LlmError::EmptyResponse { .. })));
}

#[tokio::test]
async fn test_retrying_client_retries_server_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/answer")
        .with_status(503)
        .with_body("overloaded")
        .expect(3)
        .create_async()
        .await;

    let agent = HttpAgentClient::new(format!("{}/answer", server.url())).unwrap();
    let client = RetryingClient::new(
        Arc::new(agent),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    );

    let result = client.complete(CompletionRequest::from_user("x")).await;

    // 1 attempt + 2 retries, all transient
    assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retrying_client_stops_on_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/answer")
        .with_status(401)
        .with_body(r#"{"error":"bad token"}"#)
        .expect(1)
        .create_async()
        .await;

    let agent = HttpAgentClient::new(format!("{}/answer", server.url())).unwrap();
    let client = RetryingClient::new(
        Arc::new(agent),
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    );

    let result = client.complete(CompletionRequest::from_user("x")).await;

    assert!(matches!(result, Err(LlmError::Authentication { .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_workers_ai_client_reads_result_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/accounts/acct/ai/run/@cf/meta/llama-3.1-8b-instruct")
        .match_header("authorization", "Bearer token")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .with_status(200)
        .with_body(r#"{"result":{"response":"hi there"},"success":true,"errors":[],"messages":[]}"#)
        .create_async()
        .await;

    let client = WorkersAiClient::new("acct", "token")
        .unwrap()
        .with_base_url(server.url());

    let response = client
        .complete(CompletionRequest::from_user("hello"))
        .await
        .unwrap();

    assert_eq!(response.text, "hi there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_workers_ai_client_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", Matcher::Any)
        .with_status(500)
        .with_body(r#"{"result":null,"success":false,"errors":[{"code":3040,"message":"Capacity temporarily exceeded"}]}"#)
        .create_async()
        .await;

    let client = WorkersAiClient::new("acct", "token")
        .unwrap()
        .with_base_url(server.url());

    let result = client.complete(CompletionRequest::from_user("hello")).await;

    match result {
        Err(e @ LlmError::Api { .. }) => {
            assert!(e.is_transient());
            assert!(e.to_string().contains("Capacity temporarily exceeded"));
        }
        other => panic!("expected API error, got {:?}", other.map(|r| r.text)),
    }
}
