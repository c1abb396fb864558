#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use askq_api::answer::{AgentAnswerer, AnswerGenerator, Locale, SimulatedAnswerer};
use askq_api::config::ApiConfig;
use askq_api::graphql::Executor;
use askq_api::handlers::{build_cors, configure};
use askq_api::store::QuestionStore;
use askq_llm_sdk::client::LlmClient;
use askq_llm_sdk::error::LlmError;
use askq_llm_sdk::types::{CompletionRequest, CompletionResponse};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct TestApp<S> {
    pub store: QuestionStore,
    pub app: S,
}

/// Scripted agent: pops queued results, then echoes the question
pub struct MockLlmClient {
    pub responses: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_results(results: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            ..Self::new()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(text_response(&format!("mock answer to: {}", prompt))))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        text: text.to_string(),
        usage: None,
    }
}

pub fn simulated_answerer() -> Arc<dyn AnswerGenerator> {
    Arc::new(SimulatedAnswerer::new(Locale::En))
}

pub fn agent_answerer(client: Arc<dyn LlmClient>, timeout: Duration) -> Arc<dyn AnswerGenerator> {
    Arc::new(AgentAnswerer::new(client, timeout))
}

pub async fn setup_test_app() -> TestApp<
    impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
> {
    setup_test_app_with(
        QuestionStore::unbounded(),
        simulated_answerer(),
        ApiConfig::default(),
    )
    .await
}

/// Each call builds an independent store, so tests never share state
pub async fn setup_test_app_with(
    store: QuestionStore,
    answerer: Arc<dyn AnswerGenerator>,
    config: ApiConfig,
) -> TestApp<
    impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
> {
    let executor = Executor::new(store.clone(), answerer);
    let app = test::init_service(
        App::new()
            .wrap(build_cors(&config.cors))
            .app_data(web::Data::new(executor))
            .configure(|cfg| configure(cfg, &config)),
    )
    .await;

    TestApp { store, app }
}

pub fn graphql_request(query: &str, variables: Option<Value>) -> actix_http::Request {
    let mut body = json!({ "query": query });
    if let Some(variables) = variables {
        body["variables"] = variables;
    }
    test::TestRequest::post()
        .uri("/graphql")
        .set_json(body)
        .to_request()
}

pub const LIST_QUERY: &str = "query GetQuestions { questions { id question answer } }";

pub const ASK_MUTATION: &str =
    "mutation AskQuestion($question: String!) { askQuestion(question: $question) { id question answer } }";

pub fn ask_request(question: &str) -> actix_http::Request {
    graphql_request(ASK_MUTATION, Some(json!({ "question": question })))
}
