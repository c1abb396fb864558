use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Workers AI text-generation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersAiRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Envelope returned by the Cloudflare REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersAiResponse {
    #[serde(default)]
    pub result: Option<WorkersAiResult>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<WorkersAiMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersAiResult {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersAiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl WorkersAiResponse {
    pub fn error_message(&self) -> String {
        if self.errors.is_empty() {
            "Unknown error".to_string()
        } else {
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}
