use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque question identifier, rendered as a decimal string on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted question together with its answer.
///
/// Records are immutable once created; the store hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
}

/// `data` payload of a `questions` query
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionsData {
    pub questions: Vec<Question>,
}

/// `data` payload of an `askQuestion` mutation
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AskQuestionData {
    #[serde(rename = "askQuestion")]
    pub ask_question: Question,
}

/// Variables accepted by the `askQuestion` mutation
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AskQuestionVariables {
    pub question: String,
}
