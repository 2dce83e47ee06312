//! Domain model definitions for generic, table-agnostic records.

use crate::domain::query::ColumnTypes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

pub mod dynamic;
pub mod registry;

pub use dynamic::DynamicModel;
pub use registry::ModelRegistry;

/// A dynamically-typed field value as it arrives from a caller.
///
/// `List` carries a sequence of scalars; inside a [`Filter`] it means a membership
/// (`IN`) match, inside a [`Record`] it is stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<FieldValue>),
    Json(JsonValue),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    /// Plain JSON view of the value (timestamps become RFC3339 strings).
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Null => JsonValue::Null,
            FieldValue::Bool(b) => JsonValue::from(*b),
            FieldValue::Int(i) => JsonValue::from(*i),
            FieldValue::Float(f) => JsonValue::from(*f),
            FieldValue::Text(s) => JsonValue::from(s.as_str()),
            FieldValue::Timestamp(ts) => JsonValue::from(ts.to_rfc3339()),
            FieldValue::List(items) => JsonValue::Array(items.iter().map(|v| v.to_json()).collect()),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

impl From<JsonValue> for FieldValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Text(n.to_string())
                }
            }
            JsonValue::String(s) => FieldValue::Text(s),
            JsonValue::Array(items) => {
                let all_scalar = items
                    .iter()
                    .all(|v| !(v.is_array() || v.is_object()));
                if all_scalar {
                    FieldValue::List(items.into_iter().map(FieldValue::from).collect())
                } else {
                    FieldValue::Json(JsonValue::Array(items))
                }
            }
            obj @ JsonValue::Object(_) => FieldValue::Json(obj),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(FieldValue::from)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(FieldValue::from).collect())
    }
}

/// Ordered field-name -> value mapping (caller naming convention, e.g. `createdBy`).
pub type Record = IndexMap<String, FieldValue>;

/// Field-name -> scalar (equality) or list (membership) selector.
pub type Filter = IndexMap<String, FieldValue>;

/// Name of the identifying field every managed table carries.
pub const ID_FIELD: &str = "id";

/// Returns the record's id when present and non-empty.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get(ID_FIELD) {
        Some(FieldValue::Text(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(FieldValue::Int(i)) => Some(i.to_string()),
        _ => None,
    }
}

/// Copy of `record` without `field`.
pub fn exclude_field(record: &Record, field: &str) -> Record {
    record
        .iter()
        .filter(|(k, _)| k.as_str() != field)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Converts a JSON object into a [`Record`]; anything else is rejected.
pub fn record_from_json(value: JsonValue) -> Result<Record, String> {
    match value {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from(v)))
            .collect()),
        other => Err(format!("record must be a JSON object, got: {}", other)),
    }
}

/// Trait that defines the contract for any model the CRUD layer can project.
///
/// The CRUD layer never needs a compile-time schema; a model only has to name
/// its table and the fields a read projects.
pub trait CrudModel: Send + Sync {
    /// Returns the name of the database table for this model.
    fn table_name(&self) -> &str;

    /// Field inventory used for SELECT projections, in caller naming convention.
    fn field_names(&self) -> Vec<String>;

    /// Catalog type of each column, when known; text binds to those columns are cast.
    fn column_types(&self) -> Option<&ColumnTypes> {
        None
    }

    /// Validates a record before it is handed to a create/update builder.
    ///
    /// Default implementation does no validation.
    fn validate_record(&self, _record: &Record) -> Result<(), String> {
        Ok(())
    }
}
