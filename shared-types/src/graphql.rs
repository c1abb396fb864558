use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Body of a `POST /graphql` request
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, unknown> | null")]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    pub fn variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables
            .get_or_insert_with(serde_json::Map::new)
            .insert(name.into(), value);
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Machine-readable error classification carried in `extensions.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body is not a valid GraphQL-over-HTTP payload
    BadRequest,
    /// Query document could not be parsed
    GraphqlParseFailed,
    /// Document does not match the schema
    GraphqlValidationFailed,
    /// Argument or variable has a missing, null or mistyped value
    BadUserInput,
    /// External answer collaborator failed
    UpstreamFailure,
    /// External answer collaborator did not answer in time
    UpstreamTimeout,
    /// Question store reached its configured capacity
    StoreExhausted,
    InternalServerError,
}

impl ErrorCode {
    /// Whether the error was caused by the request rather than the server
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorCode::BadRequest
                | ErrorCode::GraphqlParseFailed
                | ErrorCode::GraphqlValidationFailed
                | ErrorCode::BadUserInput
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorExtensions {
    pub code: ErrorCode,
}

/// One segment of a response path: a field name or a list index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// 1-based position in the query document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GraphQlError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub locations: Option<Vec<Location>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub path: Option<Vec<PathSegment>>,
    pub extensions: ErrorExtensions,
}

impl GraphQlError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: ErrorExtensions { code },
        }
    }

    pub fn at_location(mut self, line: usize, column: usize) -> Self {
        self.locations
            .get_or_insert_with(Vec::new)
            .push(Location { line, column });
        self
    }

    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.path = Some(vec![PathSegment::Field(field.into())]);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.extensions.code
    }
}

/// Response envelope.
///
/// `data` is omitted entirely for request errors (nothing was executed) and is
/// `null` when execution started but a root field failed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GraphQlResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, unknown> | null")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Request-level failure: nothing was executed
    pub fn request_errors(errors: Vec<GraphQlError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Execution-level failure: a non-null root field could not be resolved
    pub fn execution_errors(errors: Vec<GraphQlError>) -> Self {
        Self {
            data: Some(serde_json::Value::Null),
            errors: Some(errors),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.as_ref().map_or(true, Vec::is_empty)
    }
}
