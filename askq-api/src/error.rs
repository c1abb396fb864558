use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared_types::{ErrorCode, GraphQlError, GraphQlResponse};
use thiserror::Error;

use crate::answer::AnswerError;
use crate::graphql::ParseError;
use crate::store::StoreError;

/// Failure of a single root field during execution
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolverError::Answer(AnswerError::Timeout(_)) => ErrorCode::UpstreamTimeout,
            ResolverError::Answer(AnswerError::Upstream(_)) => ErrorCode::UpstreamFailure,
            ResolverError::Store(StoreError::Exhausted { .. }) => ErrorCode::StoreExhausted,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}", summarize(.0))]
    Validation(Vec<GraphQlError>),

    #[error("Field \"{field}\" failed: {source}")]
    Resolver {
        field: String,
        #[source]
        source: ResolverError,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn summarize(errors: &[GraphQlError]) -> String {
    match errors {
        [] => "Validation failed".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::Parse(err) => err.to_graphql_error().code(),
            ApiError::Validation(errors) => errors
                .first()
                .map(GraphQlError::code)
                .unwrap_or(ErrorCode::GraphqlValidationFailed),
            ApiError::Resolver { source, .. } => source.code(),
            ApiError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    /// The response envelope for this error.
    ///
    /// Resolver failures keep `data: null` because execution had started;
    /// everything else omits `data`.
    pub fn to_graphql_response(&self) -> GraphQlResponse {
        match self {
            ApiError::BadRequest(message) => GraphQlResponse::request_errors(vec![
                GraphQlError::new(ErrorCode::BadRequest, message.clone()),
            ]),
            ApiError::Parse(err) => GraphQlResponse::request_errors(vec![err.to_graphql_error()]),
            ApiError::Validation(errors) => GraphQlResponse::request_errors(errors.clone()),
            ApiError::Resolver { field, source } => GraphQlResponse::execution_errors(vec![
                GraphQlError::new(source.code(), source.to_string()).at_field(field.clone()),
            ]),
            ApiError::Internal(_) => GraphQlResponse::request_errors(vec![GraphQlError::new(
                ErrorCode::InternalServerError,
                "Internal server error",
            )]),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Parse(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Resolver { .. } => StatusCode::OK,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_graphql_response())
    }
}
