use actix_web::{get, web, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::graphql::Executor;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of stored questions
    pub questions: usize,
    pub answer_mode: String,
}

#[get("/health")]
pub async fn health_check(executor: web::Data<Executor>) -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        questions: executor.store().len(),
        answer_mode: executor.answer_mode().to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
