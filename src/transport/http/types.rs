use crate::app::{CrudParams, CrudService};
use crate::domain::access::UserInfo;
use crate::domain::model::{Filter, Record};
use crate::domain::query::Sort;
use crate::storage::{CustomLog, LogKind};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub crud: CrudService,
}

/// Body of every `/api/crud/{table}/*` call. The table comes from the path.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CrudRequest {
    #[schema(value_type = Object)]
    pub user_info: UserInfo,
    /// Records to create or update.
    #[schema(value_type = Vec<Object>)]
    pub action_params: Vec<Record>,
    pub record_ids: Vec<String>,
    /// `{ "field": value }` equality, or `{ "field": [v1, v2] }` membership.
    #[schema(value_type = Object)]
    pub query_params: Filter,
    /// `{ "field": 1 }` ascending, `{ "field": -1 }` descending.
    #[schema(value_type = Object)]
    pub sort_params: Sort,
    pub project_params: Vec<String>,
    pub skip: i64,
    pub limit: i64,
}

impl CrudRequest {
    pub fn into_params(self, table_name: String) -> CrudParams {
        CrudParams {
            table_name,
            user_info: self.user_info,
            action_params: self.action_params,
            record_ids: self.record_ids,
            query_params: self.query_params,
            sort_params: self.sort_params,
            project_params: self.project_params,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Body of `/api/audit/custom`: the caller plus the entry to write.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomLogRequest {
    pub user_info: UserInfo,
    pub table_name: String,
    #[schema(value_type = Object)]
    pub log_records: Option<JsonValue>,
    #[schema(value_type = Object)]
    pub new_log_records: Option<JsonValue>,
    /// `create`, `update`, `read`, `delete`, `login` or `logout`.
    #[schema(value_type = Option<String>)]
    pub log_type: Option<LogKind>,
    /// Defaults to the caller's user id.
    pub log_by: String,
}

impl CustomLogRequest {
    pub fn into_parts(self) -> (UserInfo, CustomLog) {
        (
            self.user_info,
            CustomLog {
                table_name: self.table_name,
                log_records: self.log_records,
                new_log_records: self.new_log_records,
                log_type: self.log_type,
                log_by: self.log_by,
            },
        )
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error taxonomy code, e.g. `notFound` or `unAuthorized`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid JSON body: {} (expected: {})", err, expected)),
            code: None,
        }),
    )
}
