//! Field/type coercion: turns a caller [`FieldValue`] into either a bind value or
//! an inline SQL literal.

use crate::domain::model::FieldValue;
use crate::domain::query::naming::validate_ident;
use crate::error::QueryBuildError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// Fixed literal pattern for timestamps, microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A positional bind value, already carrying the Postgres type it is sent as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Json(JsonValue),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Text view used by tests and diagnostics.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Uuid(u) => Some(u.to_string()),
            _ => None,
        }
    }
}

/// Catalog type (`udt_name`) of each column, keyed by column name.
///
/// Values headed for a known column are sent as text and cast to the column's
/// type in the statement, so dates, numerics, enums and uuids supplied as JSON
/// strings land in their columns unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTypes(HashMap<String, String>);

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, udt_name: impl Into<String>) {
        self.0.insert(column.into(), udt_name.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Column types that take a text bind as-is.
const TEXT_TYPES: &[&str] = &["text", "varchar", "bpchar", "name"];

/// SQL spelling of a catalog type; array types (`_int4`) become `int4[]`.
fn cast_type(udt_name: &str) -> Option<String> {
    let (base, array) = match udt_name.strip_prefix('_') {
        Some(base) => (base, true),
        None => (udt_name, false),
    };
    if !validate_ident(base) {
        return None;
    }
    Some(if array { format!("{}[]", base) } else { base.to_string() })
}

/// `{"a","b"}` array input for array-typed columns.
fn array_literal(items: &[FieldValue]) -> Result<String, QueryBuildError> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(match item {
            FieldValue::Null => "NULL".to_string(),
            FieldValue::List(_) | FieldValue::Json(_) => {
                return Err(QueryBuildError::new(format!(
                    "unsupported value inside a list: {}",
                    item.to_json()
                )))
            }
            scalar => format!(
                "\"{}\"",
                text_form(scalar).replace('\\', "\\\\").replace('"', "\\\"")
            ),
        });
    }
    Ok(format!("{{{}}}", parts.join(",")))
}

/// Text input form of a non-null value.
fn text_form(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Timestamp(ts) => ts.to_rfc3339(),
        other => other.to_json().to_string(),
    }
}

/// Placeholder text and bind value for `value` landing in (or compared with) `column`.
///
/// Without a catalog type for the column the value is bound by its own shape
/// (see [`bind_value`]).
pub fn bind_param(
    index: usize,
    column: &str,
    value: &FieldValue,
    types: &ColumnTypes,
) -> Result<(String, SqlValue), QueryBuildError> {
    let placeholder = format!("${}", index);
    let Some(udt_name) = types.get(column) else {
        return Ok((placeholder, bind_value(value)?));
    };
    if matches!(value, FieldValue::Null) {
        return Ok((placeholder, SqlValue::Null));
    }
    let text = match value {
        FieldValue::List(items) if udt_name.starts_with('_') => array_literal(items)?,
        other => text_form(other),
    };
    if TEXT_TYPES.contains(&udt_name) {
        return Ok((placeholder, SqlValue::Text(text)));
    }
    match cast_type(udt_name) {
        Some(cast) => Ok((format!("{}::{}", placeholder, cast), SqlValue::Text(text))),
        None => Ok((placeholder, bind_value(value)?)),
    }
}

/// Strings that hold a JSON object or array are stored-JSON text.
fn json_text(s: &str) -> Option<JsonValue> {
    let trimmed = s.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    serde_json::from_str::<JsonValue>(s)
        .ok()
        .filter(|v| v.is_object() || v.is_array())
}

/// Only the canonical 36-character form counts; 32-digit hex strings stay text.
fn hyphenated_uuid(s: &str) -> Option<Uuid> {
    if s.len() != 36 {
        return None;
    }
    Uuid::parse_str(s).ok()
}

/// Coerces a value for positional binding when the column type is unknown.
pub fn bind_value(value: &FieldValue) -> Result<SqlValue, QueryBuildError> {
    Ok(match value {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Bool(b) => SqlValue::Bool(*b),
        FieldValue::Int(i) => SqlValue::Int(*i),
        FieldValue::Float(f) => SqlValue::Float(*f),
        FieldValue::Timestamp(ts) => SqlValue::Timestamp(*ts),
        FieldValue::Text(s) => {
            if let Some(u) = hyphenated_uuid(s) {
                SqlValue::Uuid(u)
            } else if let Some(v) = json_text(s) {
                SqlValue::Json(v)
            } else {
                SqlValue::Text(s.clone())
            }
        }
        FieldValue::Json(v) => SqlValue::Json(v.clone()),
        FieldValue::List(_) => SqlValue::Json(value.to_json()),
    })
}

/// Renders one `IN (...)` member as an SQL literal. Strings are single-quoted with
/// embedded quotes doubled; numbers and booleans are emitted bare.
pub fn literal(value: &FieldValue) -> Result<String, QueryBuildError> {
    match value {
        FieldValue::Null => Ok("NULL".to_string()),
        FieldValue::Bool(b) => Ok(b.to_string()),
        FieldValue::Int(i) => Ok(i.to_string()),
        FieldValue::Float(f) if f.is_finite() => Ok(f.to_string()),
        FieldValue::Float(f) => Err(QueryBuildError::new(format!(
            "unsupported numeric value: {}",
            f
        ))),
        FieldValue::Text(s) => Ok(quote(s)),
        FieldValue::Timestamp(ts) => Ok(quote(&format_timestamp(ts))),
        FieldValue::List(_) | FieldValue::Json(_) => Err(QueryBuildError::new(format!(
            "unsupported value inside a list: {}",
            value.to_json()
        ))),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
