use std::sync::Arc;

use serde_json::{Map, Value as Json};
use shared_types::{GraphQlRequest, Question};
use tracing::{debug, info, warn};

use super::parse_document;
use super::plan::{prepare, OperationType, PreparedOperation, RootField};
use crate::answer::AnswerGenerator;
use crate::error::{ApiError, ResolverError};
use crate::store::QuestionStore;

/// Resolves prepared operations against the question store.
///
/// Cloning is cheap; clones share the same store and answer generator.
#[derive(Clone)]
pub struct Executor {
    store: QuestionStore,
    answerer: Arc<dyn AnswerGenerator>,
}

impl Executor {
    pub fn new(store: QuestionStore, answerer: Arc<dyn AnswerGenerator>) -> Self {
        Self { store, answerer }
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn answer_mode(&self) -> &str {
        self.answerer.mode()
    }

    /// Parse and validate a request without touching the store
    pub fn prepare(&self, request: &GraphQlRequest) -> Result<PreparedOperation, ApiError> {
        let document = parse_document(&request.query)?;
        prepare(
            &document,
            request.operation_name.as_deref(),
            request.variables.as_ref(),
        )
        .map_err(ApiError::Validation)
    }

    pub async fn execute(&self, request: &GraphQlRequest) -> Result<Json, ApiError> {
        let operation = self.prepare(request)?;
        self.run(operation).await
    }

    pub async fn run(&self, operation: PreparedOperation) -> Result<Json, ApiError> {
        debug!(
            operation = operation.label(),
            kind = %operation.kind,
            fields = operation.fields.len(),
            "Executing operation"
        );

        match operation.kind {
            OperationType::Query => Ok(self.run_query(&operation)),
            OperationType::Mutation => self.run_mutation(operation).await,
            OperationType::Subscription => Err(ApiError::Internal(
                "subscription reached the executor".to_string(),
            )),
        }
    }

    // Every field of a query reads the same snapshot
    fn run_query(&self, operation: &PreparedOperation) -> Json {
        let snapshot = self.store.list();
        let mut data = Map::new();
        for (key, field) in &operation.fields {
            data.insert(key.clone(), resolve_read(field, &snapshot));
        }
        Json::Object(data)
    }

    /// Root mutation fields run in document order.
    ///
    /// Planning admits at most one `askQuestion` per operation, so a failure
    /// here never follows an earlier committed write.
    async fn run_mutation(&self, operation: PreparedOperation) -> Result<Json, ApiError> {
        let mut data = Map::new();
        for (key, field) in operation.fields {
            let value = match field {
                RootField::AskQuestion {
                    question,
                    projection,
                } => {
                    let record = self.ask_question(&question).await.map_err(|source| {
                        warn!(field = %key, error = %source, "askQuestion failed");
                        ApiError::Resolver {
                            field: key.clone(),
                            source,
                        }
                    })?;
                    projection.project(&record)
                }
                other => resolve_read(&other, &self.store.list()),
            };
            data.insert(key, value);
        }
        Ok(Json::Object(data))
    }

    /// Generate an answer and store the new record.
    ///
    /// Generation happens before the store is touched, so a failed or timed out
    /// answer leaves the store unchanged.
    pub async fn ask_question(&self, question: &str) -> Result<Question, ResolverError> {
        let answer = self.answerer.answer(question).await?;
        let record = self.store.append(question, answer)?;
        info!(
            question_id = %record.id,
            mode = self.answerer.mode(),
            "Stored question"
        );
        Ok(record)
    }
}

fn resolve_read(field: &RootField, snapshot: &[Question]) -> Json {
    match field {
        RootField::Typename(type_name) => Json::String(type_name.to_string()),
        RootField::Questions(projection) => {
            Json::Array(snapshot.iter().map(|q| projection.project(q)).collect())
        }
        // Only planned for mutations
        RootField::AskQuestion { .. } => Json::Null,
    }
}
