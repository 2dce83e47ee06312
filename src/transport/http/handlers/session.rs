use crate::domain::access::UserInfo;
use crate::transport::http::handlers::common::result_response;
use crate::transport::http::types::{json_422, ApiResponse, AppState, CustomLogRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

/// Confirms the caller is a registered user with a live session; expired sessions are removed.
#[utoipa::path(
    post,
    path = "/api/session/status",
    request_body = UserInfo,
    responses(
        (status = 200, description = "Session is live; data is the user id", body = ApiResponse),
        (status = 401, description = "Unknown user, no session, or session expired", body = ApiResponse)
    )
)]
pub async fn login_status_handler(
    State(state): State<AppState>,
    request: Result<Json<UserInfo>, JsonRejection>,
) -> impl IntoResponse {
    let Json(user) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"userId\": ..., \"loginName\": ..., \"token\": ...}").into_response(),
    };
    result_response(state.crud.check_login_status(&user).await)
}

#[utoipa::path(
    post,
    path = "/api/audit/custom",
    request_body = CustomLogRequest,
    responses(
        (status = 200, description = "Entry written", body = ApiResponse),
        (status = 400, description = "logRecords missing", body = ApiResponse),
        (status = 401, description = "Unknown user or session expired", body = ApiResponse),
        (status = 500, description = "Audit table write failed", body = ApiResponse)
    )
)]
pub async fn custom_log_handler(
    State(state): State<AppState>,
    request: Result<Json<CustomLogRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"userInfo\": {...}, \"logRecords\": ...}").into_response(),
    };
    let (user, entry) = request.into_parts();
    result_response(state.crud.custom_log(&user, &entry).await)
}
