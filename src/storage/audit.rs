//! Audit-log collaborator: kinds, payloads and the validation every sink applies.

use crate::error::CrudError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Create,
    Update,
    Read,
    Delete,
    Login,
    Logout,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Create => "create",
            LogKind::Update => "update",
            LogKind::Read => "read",
            LogKind::Delete => "delete",
            LogKind::Login => "login",
            LogKind::Logout => "logout",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an audit entry. `log_records` holds the old (or only) records,
/// `new_log_records` the post-update state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub table_name: String,
    pub log_records: Option<JsonValue>,
    pub new_log_records: Option<JsonValue>,
}

/// Free-form entry; only `log_records` and `log_by` are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomLog {
    pub table_name: String,
    pub log_records: Option<JsonValue>,
    pub new_log_records: Option<JsonValue>,
    pub log_type: Option<LogKind>,
    pub log_by: String,
}

/// Outcome embedded in CRUD results; a failed write is reported here, never raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOutcome {
    pub ok: bool,
    pub rows_affected: u64,
    pub message: String,
}

impl LogOutcome {
    pub fn written(rows_affected: u64) -> Self {
        Self {
            ok: true,
            rows_affected,
            message: "successful audit-log action".to_string(),
        }
    }

    pub fn failed(err: &CrudError) -> Self {
        Self {
            ok: false,
            rows_affected: 0,
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn audit_log(&self, kind: LogKind, user_id: &str, entry: &AuditEntry) -> Result<LogOutcome, CrudError>;
    async fn custom_log(&self, entry: &CustomLog) -> Result<LogOutcome, CrudError>;
}

fn missing(value: &Option<JsonValue>) -> bool {
    matches!(value, None | Some(JsonValue::Null))
}

/// Table name the entry is written under; login/logout default to `users`.
pub fn log_table_name(kind: LogKind, entry: &AuditEntry) -> String {
    match kind {
        LogKind::Login | LogKind::Logout if entry.table_name.is_empty() => "users".to_string(),
        _ => entry.table_name.clone(),
    }
}

/// Checks the fields each kind requires; all problems are reported together.
pub fn validate_entry(kind: LogKind, user_id: &str, entry: &AuditEntry) -> Result<(), CrudError> {
    let mut problems: Vec<&str> = Vec::new();
    if log_table_name(kind, entry).is_empty() {
        problems.push("Table or Collection name is required.");
    }
    if user_id.is_empty() {
        problems.push("userId is required.");
    }
    if missing(&entry.log_records) {
        problems.push(match kind {
            LogKind::Create => "Created record(s) information is required.",
            LogKind::Update => "Updated record(s) information is required.",
            LogKind::Read => "Read/Get Params/Keywords information is required.",
            LogKind::Delete => "Deleted record(s) information is required.",
            LogKind::Login => "Login information is required.",
            LogKind::Logout => "Logout information is required.",
        });
    }
    if kind == LogKind::Update && missing(&entry.new_log_records) {
        problems.push("New/Update record(s) information is required.");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CrudError::params(problems.join(" | ")))
    }
}

pub fn validate_custom(entry: &CustomLog) -> Result<(), CrudError> {
    let mut problems: Vec<&str> = Vec::new();
    if entry.log_by.is_empty() {
        problems.push("userId is required.");
    }
    if missing(&entry.log_records) {
        problems.push("Data / information to be logged is required.");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CrudError::params(problems.join(" | ")))
    }
}
