//! Wire types shared by the askq API server and its clients.

pub mod graphql;
pub mod question;
pub mod typescript_gen;

pub use typescript_gen::generate_typescript_definitions;

pub use graphql::{
    ErrorCode, ErrorExtensions, GraphQlError, GraphQlRequest, GraphQlResponse, Location,
    PathSegment,
};
pub use question::{AskQuestionData, AskQuestionVariables, Question, QuestionId, QuestionsData};
