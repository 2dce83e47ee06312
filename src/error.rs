//! Error taxonomy shared by the query builders, the access engine and the CRUD façade.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Fixed set of outcome codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    ParamsError,
    ReadError,
    InsertError,
    UpdateError,
    DeleteError,
    RemoveError,
    NotFound,
    UnAuthorized,
    TokenExpired,
    SaveError,
    LogError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParamsError => "paramsError",
            ErrorCode::ReadError => "readError",
            ErrorCode::InsertError => "insertError",
            ErrorCode::UpdateError => "updateError",
            ErrorCode::DeleteError => "deleteError",
            ErrorCode::RemoveError => "removeError",
            ErrorCode::NotFound => "notFound",
            ErrorCode::UnAuthorized => "unAuthorized",
            ErrorCode::TokenExpired => "tokenExpired",
            ErrorCode::SaveError => "saveError",
            ErrorCode::LogError => "logError",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller-facing error envelope: `{code, message, value}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("Error-code: {code} | Error-message: {message}")]
pub struct CrudError {
    pub code: ErrorCode,
    pub message: String,
    pub value: Option<JsonValue>,
}

impl CrudError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: JsonValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParamsError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnAuthorized, message)
    }

    /// Wraps a driver failure, keeping the driver text verbatim.
    pub fn from_db(code: ErrorCode, context: &str, err: impl fmt::Display) -> Self {
        Self::new(code, format!("{}: {}", context, err))
    }
}

/// Failure raised by a query builder before any SQL reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct QueryBuildError(pub String);

impl QueryBuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn into_crud(self, code: ErrorCode) -> CrudError {
        CrudError::new(code, self.0)
    }
}
