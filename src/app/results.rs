//! Result envelopes returned by the CRUD façade.

use crate::domain::access::TaskType;
use crate::domain::model::Filter;
use crate::domain::query::naming::field_name;
use crate::error::{CrudError, ErrorCode};
use crate::storage::{JsonRow, LogOutcome};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Outcome of a create/update/delete task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudResult {
    pub query_param: Filter,
    pub record_ids: Vec<String>,
    pub records_count: usize,
    pub task_type: TaskType,
    pub log_res: Option<LogOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStats {
    pub skip: u64,
    pub limit: u64,
    pub records_count: usize,
    pub total_records_count: i64,
    pub query_param: Filter,
    pub record_ids: Vec<String>,
}

/// Outcome of a read task. Records carry caller (camelCase) field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResult {
    pub records: Vec<JsonRow>,
    pub stats: GetStats,
    pub task_type: TaskType,
    pub log_res: Option<LogOutcome>,
}

/// Table-wide and caller-owned row counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsCount {
    pub total_records_count: i64,
    pub owner_records_count: i64,
}

impl GetResult {
    /// Decodes every record into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, CrudError> {
        self.records
            .iter()
            .map(|r| {
                serde_json::from_value(JsonValue::Object(r.clone())).map_err(|e| {
                    CrudError::new(
                        ErrorCode::ReadError,
                        format!("Error transforming result-value into the requested type: {}", e),
                    )
                })
            })
            .collect()
    }
}

/// Renames storage columns to caller field names, keeping column order.
pub fn to_caller_naming(row: JsonRow) -> JsonRow {
    row.into_iter().map(|(k, v)| (field_name(&k), v)).collect()
}
