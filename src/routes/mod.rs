//! HTTP handlers.

use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::services::ServiceError;

pub mod search;

/// Registers every search endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(search::search_get)
        .service(search::search_post)
        .service(search::search_nearby)
        .service(search::search_suggestions)
        .service(search::search_popular)
        .service(search::search_discounted)
        .service(search::search_categories)
        .service(search::search_price_range)
        .service(search::search_locations)
        .service(search::search_similar);
}

/// Maps a service failure onto an HTTP response.
pub fn error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::Validation(fields) => HttpResponse::BadRequest().json(json!({
            "error": "validation_failed",
            "fields": fields,
        })),
        ServiceError::TypeConstraint(message) => HttpResponse::BadRequest().json(json!({
            "error": "invalid_value",
            "message": message,
        })),
        ServiceError::NotFound => {
            HttpResponse::NotFound().json(json!({ "error": "not_found" }))
        }
        ServiceError::Timeout => {
            HttpResponse::GatewayTimeout().json(json!({ "error": "timeout" }))
        }
        ServiceError::Repository(_) | ServiceError::Internal(_) => {
            log::error!("Request failed: {err}");
            HttpResponse::InternalServerError().json(json!({ "error": "internal_error" }))
        }
    }
}
