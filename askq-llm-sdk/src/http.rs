use crate::error::LlmError;

/// Turn a non-success response into an [`LlmError`], reading the body for the message.
///
/// `extract_message` may pull a nicer message out of a provider-specific error body.
pub(crate) async fn error_from_response<F>(response: reqwest::Response, extract_message: F) -> LlmError
where
    F: Fn(&str) -> Option<String>,
{
    let status = response.status();

    // Get retry-after header before consuming the response
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok());

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = extract_message(&error_text).unwrap_or(error_text);
    LlmError::from_status(status, message, retry_after)
}

pub(crate) fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Network { source: e })
}
