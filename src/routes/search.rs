use std::time::Duration;

use actix_web::rt::time::timeout;
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::forms::search::{LimitForm, SearchForm, SuggestionForm};
use crate::models::config::SearchSettings;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::search as search_service;
use crate::services::{ServiceError, ServiceResult};

/// Runs `task` on the blocking pool under the configured deadline. On
/// expiry the result is discarded.
async fn run_blocking<T, F>(settings: &SearchSettings, task: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let deadline = Duration::from_millis(settings.timeout_ms);
    match timeout(deadline, web::block(task)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(ServiceError::Internal(format!("blocking task failed: {err}"))),
        Err(_) => {
            log::warn!("Request exceeded the {} ms deadline", settings.timeout_ms);
            Err(ServiceError::Timeout)
        }
    }
}

fn respond<T: Serialize>(result: ServiceResult<T>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(err) => error_response(&err),
    }
}

/// Parses the raw query string, keeping repeated keys.
fn query_form<T: DeserializeOwned>(req: &HttpRequest) -> Result<T, HttpResponse> {
    serde_html_form::from_str(req.query_string()).map_err(|err| {
        log::debug!("Rejected query string `{}`: {err}", req.query_string());
        HttpResponse::BadRequest().json(json!({
            "error": "invalid_query",
            "message": err.to_string(),
        }))
    })
}

#[get("/search")]
pub async fn search_get(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: SearchForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let repo = repo.get_ref().clone();
    let task_settings = settings.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::search(&repo, form, &task_settings)
        })
        .await,
    )
}

#[post("/search")]
pub async fn search_post(
    form: web::Json<SearchForm>,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form = form.into_inner();
    let repo = repo.get_ref().clone();
    let task_settings = settings.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::search(&repo, form, &task_settings)
        })
        .await,
    )
}

#[get("/search/nearby")]
pub async fn search_nearby(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: SearchForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let repo = repo.get_ref().clone();
    let task_settings = settings.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::search_nearby(&repo, form, &task_settings)
        })
        .await,
    )
}

#[get("/search/suggestions")]
pub async fn search_suggestions(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: SuggestionForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let repo = repo.get_ref().clone();
    let task_settings = settings.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::suggestions(&repo, form, &task_settings)
        })
        .await,
    )
}

#[get("/search/popular")]
pub async fn search_popular(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: LimitForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let repo = repo.get_ref().clone();
    respond(run_blocking(&settings, move || search_service::popular(&repo, &form)).await)
}

#[get("/search/discounted")]
pub async fn search_discounted(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: LimitForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let repo = repo.get_ref().clone();
    let task_settings = settings.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::discounted(&repo, &form, &task_settings)
        })
        .await,
    )
}

#[get("/search/categories")]
pub async fn search_categories(
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let repo = repo.get_ref().clone();
    respond(run_blocking(&settings, move || search_service::categories(&repo)).await)
}

#[get("/search/price-range")]
pub async fn search_price_range(
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let repo = repo.get_ref().clone();
    respond(run_blocking(&settings, move || search_service::global_price_range(&repo)).await)
}

#[get("/search/locations")]
pub async fn search_locations(
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let repo = repo.get_ref().clone();
    respond(run_blocking(&settings, move || search_service::locations(&repo)).await)
}

#[get("/search/similar/{listing_id}")]
pub async fn search_similar(
    req: HttpRequest,
    listing_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    settings: web::Data<SearchSettings>,
) -> impl Responder {
    let form: LimitForm = match query_form(&req) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let listing_id = listing_id.into_inner();
    let repo = repo.get_ref().clone();
    respond(
        run_blocking(&settings, move || {
            search_service::similar(&repo, listing_id, &form)
        })
        .await,
    )
}
