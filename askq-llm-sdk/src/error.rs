use thiserror::Error;

/// Error types for calls to the external reasoning agent
#[derive(Error, Debug)]
pub enum LlmError {
    /// Authentication failed (HTTP 401/403)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Invalid request parameters (HTTP 400/413/422)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// API error with status code (HTTP 4xx/5xx except above)
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON parsing or serialization error
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// The agent did not answer within the allotted time
    #[error("Timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// The agent answered but produced no text
    #[error("Empty response: {message}")]
    EmptyResponse { message: String },

    /// Generic error for unexpected cases
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LlmError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api_error(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    pub fn timeout(elapsed: std::time::Duration) -> Self {
        Self::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn empty_response<S: Into<String>>(message: S) -> Self {
        Self::EmptyResponse {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Validation and authentication failures are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimit { .. } | LlmError::Timeout { .. } => true,
            LlmError::Api { status, .. } => *status >= 500 || *status == 408,
            LlmError::Network { source } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            LlmError::Authentication { .. }
            | LlmError::InvalidRequest { .. }
            | LlmError::Parse { .. }
            | LlmError::EmptyResponse { .. }
            | LlmError::Internal { .. } => false,
        }
    }

    /// Map a non-success HTTP status and its body text onto an error
    pub fn from_status(status: reqwest::StatusCode, message: String, retry_after: Option<u64>) -> Self {
        match status {
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                LlmError::invalid_request(message)
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                LlmError::authentication(message)
            }
            reqwest::StatusCode::PAYLOAD_TOO_LARGE => LlmError::invalid_request("Request too large"),
            reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limit(message, retry_after),
            _ => LlmError::api_error(status.as_u16(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_errors_are_transient() {
        assert!(LlmError::from_status(StatusCode::BAD_GATEWAY, "down".into(), None).is_transient());
        assert!(
            LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), Some(2))
                .is_transient()
        );
        assert!(LlmError::timeout(std::time::Duration::from_secs(1)).is_transient());
    }

    #[test]
    fn test_validation_errors_are_not_transient() {
        assert!(!LlmError::from_status(StatusCode::BAD_REQUEST, "bad".into(), None).is_transient());
        assert!(!LlmError::from_status(StatusCode::UNAUTHORIZED, "no".into(), None).is_transient());
        assert!(!LlmError::from_status(StatusCode::NOT_FOUND, "gone".into(), None).is_transient());
        assert!(!LlmError::empty_response("nothing").is_transient());
    }
}
