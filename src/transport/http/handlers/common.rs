use crate::app::Crud;
use crate::error::{CrudError, ErrorCode};
use crate::transport::http::types::{json_422, ApiResponse, AppState, CrudRequest};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ParamsError | ErrorCode::SaveError | ErrorCode::RemoveError => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UnAuthorized | ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
        ErrorCode::ReadError
        | ErrorCode::InsertError
        | ErrorCode::UpdateError
        | ErrorCode::DeleteError
        | ErrorCode::LogError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: CrudError) -> Response {
    (
        status_for(err.code),
        Json(ApiResponse {
            success: false,
            data: err.value,
            error: Some(err.message),
            code: Some(err.code.as_str().to_string()),
        }),
    )
        .into_response()
}

pub fn result_response<T: Serialize>(result: Result<T, CrudError>) -> Response {
    match result.and_then(|v| {
        serde_json::to_value(v).map_err(|e| CrudError::new(ErrorCode::ReadError, e.to_string()))
    }) {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Unwraps the body and builds the per-call façade for `table`.
pub async fn crud_for(
    state: &AppState,
    table: String,
    request: Result<Json<CrudRequest>, JsonRejection>,
) -> Result<Crud, Response> {
    let Json(request) = request
        .map_err(|e| json_422(e, "{\"userInfo\": {...}, \"actionParams\": [...], ...}").into_response())?;
    let table = table.trim().to_string();
    state
        .crud
        .crud(request.into_params(table))
        .await
        .map_err(error_response)
}
