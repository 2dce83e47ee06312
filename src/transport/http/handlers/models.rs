use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Tables known to the model registry with their projected fields.
#[utoipa::path(
    get,
    path = "/api/models",
    responses((status = 200, description = "Registered models", body = ApiResponse))
)]
pub async fn list_models_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.crud.registry();
    let registry = registry.read().await;
    let models: Vec<serde_json::Value> = registry
        .list_models()
        .into_iter()
        .filter_map(|name| {
            registry.get(&name).map(|m| {
                serde_json::json!({ "tableName": m.table_name(), "fields": m.field_names() })
            })
        })
        .collect();
    (StatusCode::OK, Json(ApiResponse::ok(serde_json::json!(models))))
}
