use crate::transport::http::handlers::{crud, health, models, session};
use crate::domain::access::UserInfo;
use crate::transport::http::types::{ApiResponse, AppState, CrudRequest, CustomLogRequest};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        models::list_models_handler,
        crud::save_handler,
        crud::delete_handler,
        crud::get_handler,
        crud::lookup_handler,
        crud::count_handler,
        session::login_status_handler,
        session::custom_log_handler
    ),
    components(schemas(ApiResponse, CrudRequest, CustomLogRequest, UserInfo))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/models", get(models::list_models_handler))
        .route("/api/crud/:table/save", post(crud::save_handler))
        .route("/api/crud/:table/delete", post(crud::delete_handler))
        .route("/api/crud/:table/get", post(crud::get_handler))
        .route("/api/crud/:table/lookup", post(crud::lookup_handler))
        .route("/api/crud/:table/count", post(crud::count_handler))
        .route("/api/session/status", post(session::login_status_handler))
        .route("/api/audit/custom", post(session::custom_log_handler))
        .with_state(app_state)
}
