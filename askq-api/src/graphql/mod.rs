//! GraphQL front end for the question schema.
//!
//! Requests flow through three stages: [`parse_document`] turns the query text
//! into a `graphql-parser` document, [`plan::prepare`] validates it against the
//! schema and coerces variables into a [`plan::PreparedOperation`], and the
//! [`Executor`] resolves that plan against the store and the answer generator.

pub mod executor;
pub mod plan;
pub mod schema;

pub use executor::Executor;
pub use plan::{OperationType, PreparedOperation, Projection, QuestionField, RootField};

use graphql_parser::query::Document;
use shared_types::{ErrorCode, GraphQlError, Location};
use thiserror::Error;

const PARSER_PREFIX: &str = "query parse error: ";
const LOCATION_PREFIX: &str = "Parse error at ";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Syntax Error: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: Option<Location>,
}

impl ParseError {
    /// Split the parser's report into its position line and the remaining detail lines
    fn from_report(report: &str) -> Self {
        let report = report.strip_prefix(PARSER_PREFIX).unwrap_or(report);
        let mut location = None;
        let mut details = Vec::new();

        for line in report.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.strip_prefix(LOCATION_PREFIX).and_then(parse_location) {
                Some(found) => location = Some(found),
                None => details.push(line),
            }
        }

        let message = if details.is_empty() {
            "Invalid document".to_string()
        } else {
            details.join("; ")
        };
        Self { message, location }
    }

    pub fn to_graphql_error(&self) -> GraphQlError {
        let error = GraphQlError::new(ErrorCode::GraphqlParseFailed, self.to_string());
        match self.location {
            Some(location) => error.at_location(location.line, location.column),
            None => error,
        }
    }
}

impl From<graphql_parser::query::ParseError> for ParseError {
    fn from(err: graphql_parser::query::ParseError) -> Self {
        Self::from_report(&err.to_string())
    }
}

fn parse_location(text: &str) -> Option<Location> {
    let (line, column) = text.split_once(':')?;
    Some(Location {
        line: line.trim().parse().ok()?,
        column: column.trim().parse().ok()?,
    })
}

pub fn parse_document(source: &str) -> Result<Document<'_, String>, ParseError> {
    Ok(graphql_parser::query::parse_query::<String>(source)?)
}
