pub mod graphql;
pub mod health;

use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::web;

use crate::config::{ApiConfig, CorsConfig};

/// Register the GraphQL endpoint and the health check
pub fn configure(cfg: &mut web::ServiceConfig, config: &ApiConfig) {
    cfg.app_data(graphql::json_config(config.server.max_body_bytes))
        .service(health::health_check)
        .service(
            web::resource(config.graphql.path.as_str())
                .route(web::post().to(graphql::graphql))
                .route(web::method(Method::OPTIONS).to(graphql::options))
                .default_service(web::to(graphql::method_not_allowed)),
        );
}

pub fn build_cors(config: &CorsConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(86400);

    if config.allows_any_origin() {
        return cors.allow_any_origin().send_wildcard();
    }

    config
        .allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
