//! Question/answer service exposed over a small GraphQL endpoint.
//!
//! Questions live in an in-memory [`store::QuestionStore`]. Each `askQuestion`
//! mutation obtains an answer from an [`answer::AnswerGenerator`] (a local
//! template by default, or an external agent) and appends the record; the
//! `questions` query returns every record in insertion order.

pub mod answer;
pub mod config;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod helpers;
pub mod store;
