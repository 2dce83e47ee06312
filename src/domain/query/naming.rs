//! Identifier handling: caller naming -> storage naming, and allow-lists for
//! anything that is spliced into SQL text instead of bound.

use crate::error::QueryBuildError;
use heck::{ToLowerCamelCase, ToSnakeCase};
use uuid::Uuid;

pub fn validate_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Table names may be schema-qualified (`audit.logs`); every part must be an identifier.
pub fn table_ident(table: &str) -> Result<&str, QueryBuildError> {
    if table.is_empty() {
        return Err(QueryBuildError::new("table-name is required"));
    }
    if !table.split('.').all(validate_ident) {
        return Err(QueryBuildError::new(format!(
            "invalid table-name: '{}'",
            table
        )));
    }
    Ok(table)
}

/// Translates a caller field name (`createdBy`) to its column name (`created_by`).
pub fn column_name(field: &str) -> Result<String, QueryBuildError> {
    let column = field.to_snake_case();
    if !validate_ident(&column) {
        return Err(QueryBuildError::new(format!(
            "invalid field-name: '{}'",
            field
        )));
    }
    Ok(column)
}

/// Translates a column name back to caller naming.
pub fn field_name(column: &str) -> String {
    column.to_lower_camel_case()
}

/// Record ids are inlined into SQL, so they must be a UUID or a short token.
pub fn validate_record_id(id: &str) -> Result<(), QueryBuildError> {
    if Uuid::parse_str(id).is_ok() {
        return Ok(());
    }
    let ok = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(QueryBuildError::new(format!("invalid record-id: '{}'", id)))
    }
}

/// `'a', 'b', 'c'` after validating every id.
pub fn id_list_literal(ids: &[String]) -> Result<String, QueryBuildError> {
    if ids.is_empty() {
        return Err(QueryBuildError::new("record-ids are required"));
    }
    let mut parts = Vec::with_capacity(ids.len());
    for id in ids {
        validate_record_id(id)?;
        parts.push(format!("'{}'", id));
    }
    Ok(parts.join(", "))
}
