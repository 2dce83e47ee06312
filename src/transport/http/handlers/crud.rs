use crate::transport::http::handlers::common::{crud_for, error_response, result_response};
use crate::transport::http::types::{json_422, ApiResponse, AppState, CrudRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/crud/{table}/save",
    params(("table" = String, Path, description = "Table name (e.g. orders)")),
    request_body = CrudRequest,
    responses(
        (status = 200, description = "Records created or updated", body = ApiResponse),
        (status = 400, description = "Invalid or ambiguous input", body = ApiResponse),
        (status = 401, description = "Access denied or session expired", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Statement failed", body = ApiResponse)
    )
)]
pub async fn save_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> impl IntoResponse {
    let crud = match crud_for(&state, table, request).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    result_response(crud.save_record().await)
}

#[utoipa::path(
    post,
    path = "/api/crud/{table}/delete",
    params(("table" = String, Path, description = "Table name (e.g. orders)")),
    request_body = CrudRequest,
    responses(
        (status = 200, description = "Records deleted", body = ApiResponse),
        (status = 400, description = "No recordIds or queryParams", body = ApiResponse),
        (status = 401, description = "Access denied or session expired", body = ApiResponse),
        (status = 404, description = "Nothing to delete", body = ApiResponse),
        (status = 500, description = "Statement failed", body = ApiResponse)
    )
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> impl IntoResponse {
    let crud = match crud_for(&state, table, request).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    result_response(crud.delete_record().await)
}

#[utoipa::path(
    post,
    path = "/api/crud/{table}/get",
    params(("table" = String, Path, description = "Table name (e.g. orders)")),
    request_body = CrudRequest,
    responses(
        (status = 200, description = "Records read", body = ApiResponse),
        (status = 401, description = "Access denied or session expired", body = ApiResponse),
        (status = 404, description = "No matching records", body = ApiResponse),
        (status = 500, description = "Statement failed", body = ApiResponse)
    )
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> impl IntoResponse {
    let crud = match crud_for(&state, table, request).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    result_response(crud.get_record().await)
}

/// Ungated read, served only for the configured lookup tables.
#[utoipa::path(
    post,
    path = "/api/crud/{table}/lookup",
    params(("table" = String, Path, description = "Table name (e.g. countries)")),
    request_body = CrudRequest,
    responses(
        (status = 200, description = "Records read", body = ApiResponse),
        (status = 401, description = "Not a lookup table", body = ApiResponse),
        (status = 404, description = "No matching records", body = ApiResponse),
        (status = 500, description = "Statement failed", body = ApiResponse)
    )
)]
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"queryParams\": {...}, ...}").into_response(),
    };
    let params = request.into_params(table.trim().to_string());
    match state.crud.lookup(params).await {
        Ok(result) => result_response(Ok(result)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/crud/{table}/count",
    params(("table" = String, Path, description = "Table name (e.g. orders)")),
    request_body = CrudRequest,
    responses(
        (status = 200, description = "Total and caller-owned row counts", body = ApiResponse),
        (status = 401, description = "Access denied or session expired", body = ApiResponse),
        (status = 500, description = "Statement failed", body = ApiResponse)
    )
)]
pub async fn count_handler(
    State(state): State<AppState>,
    Path(table): Path<String>,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> impl IntoResponse {
    let crud = match crud_for(&state, table, request).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    result_response(crud.records_count().await)
}
