//! The fixed schema served at the GraphQL endpoint.

pub const SCHEMA_SDL: &str = r#"type Question {
  id: ID!
  question: String!
  answer: String!
}

type Query {
  questions: [Question!]!
}

type Mutation {
  askQuestion(question: String!): Question!
}
"#;

pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";
pub const QUESTION_TYPE: &str = "Question";

pub const TYPENAME_FIELD: &str = "__typename";
pub const QUESTIONS_FIELD: &str = "questions";
pub const ASK_QUESTION_FIELD: &str = "askQuestion";
pub const QUESTION_ARG: &str = "question";

/// Scalar types a variable may be declared with
pub const INPUT_SCALARS: &[&str] = &["String", "ID", "Int", "Float", "Boolean"];

/// Declared type of a `Question` field, for error messages
pub fn question_field_type(field: &str) -> Option<&'static str> {
    match field {
        "id" => Some("ID!"),
        "question" | "answer" => Some("String!"),
        TYPENAME_FIELD => Some("String!"),
        _ => None,
    }
}
