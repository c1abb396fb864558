use actix_web::http::header;
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use shared_types::{ErrorCode, GraphQlError, GraphQlRequest, GraphQlResponse};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::graphql::Executor;

const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// `POST /graphql`
pub async fn graphql(
    executor: web::Data<Executor>,
    body: web::Json<GraphQlRequest>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let request = body.into_inner();

    match execute(&executor, request).await {
        Ok(data) => {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "GraphQL request completed");
            Ok(HttpResponse::Ok().json(GraphQlResponse::data(data)))
        }
        Err(err) => {
            match &err {
                ApiError::Resolver { .. } | ApiError::Internal(_) => {
                    error!(error = %err, code = ?err.code(), "GraphQL execution failed")
                }
                _ => warn!(error = %err, code = ?err.code(), "GraphQL request rejected"),
            }
            Err(err)
        }
    }
}

async fn execute(executor: &Executor, request: GraphQlRequest) -> Result<serde_json::Value, ApiError> {
    let operation = executor.prepare(&request)?;
    info!(
        operation = operation.label(),
        kind = %operation.kind,
        "Executing GraphQL operation"
    );

    if !operation.is_mutation() {
        return executor.run(operation).await;
    }

    // Writes run on their own task so a dropped connection cannot cancel them halfway
    let executor = executor.clone();
    actix_web::rt::spawn(async move { executor.run(operation).await })
        .await
        .map_err(|e| ApiError::Internal(format!("mutation task failed: {}", e)))?
}

/// Plain `OPTIONS` without CORS preflight headers
pub async fn options() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ALLOW, ALLOWED_METHODS))
        .finish()
}

pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, ALLOWED_METHODS))
        .json(GraphQlResponse::request_errors(vec![GraphQlError::new(
            ErrorCode::BadRequest,
            format!(
                "Method {} is not allowed; GraphQL requests must use POST",
                req.method()
            ),
        )]))
}

/// JSON extractor settings for the endpoint: body limit and error envelope
pub fn json_config(max_body_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_body_bytes)
        .error_handler(|err, _req| {
            let message = match &err {
                JsonPayloadError::OverflowKnownLength { length, limit } => format!(
                    "Request body of {} bytes exceeds the {} byte limit",
                    length, limit
                ),
                JsonPayloadError::Overflow { limit } => {
                    format!("Request body exceeds the {} byte limit", limit)
                }
                JsonPayloadError::ContentType => {
                    "Content-Type must be application/json".to_string()
                }
                other => other.to_string(),
            };
            ApiError::BadRequest(message).into()
        })
}
